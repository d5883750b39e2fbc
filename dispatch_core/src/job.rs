/// A named, sized byte payload transferred verbatim over the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct Buffer {
    pub name: String,
    pub data: Vec<u8>,
}

impl Buffer {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Buffer {
            name: name.into(),
            data,
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// A job: the executable and input Buffers, plus the command the Worker
/// runs to produce an output file. Materialized on the Master once a
/// Client finishes uploading, re-materialized as local files on the
/// Worker for the duration of execution, and never persisted (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub executable: Buffer,
    pub input: Buffer,
    pub command: String,
}

impl Job {
    pub fn new(executable: Buffer, input: Buffer) -> Self {
        let command = format!("./{} {}", executable.name, input.name);
        Job {
            executable,
            input,
            command,
        }
    }
}

/// The naming convention a job binary must honor for its output to be
/// picked up by the Worker: `<exe_basename>_output.txt` (spec §6).
pub fn output_file_name(exe_name: &str) -> String {
    format!("{}_output.txt", exe_name)
}

/// Strips any directory components, matching the wire contract that only
/// basenames travel in metadata lines (spec §3).
pub fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_template_uses_basenames() {
        let job = Job::new(
            Buffer::new("countwords", vec![1, 2, 3]),
            Buffer::new("input.txt", vec![4, 5]),
        );
        assert_eq!(job.command, "./countwords input.txt");
    }

    #[test]
    fn output_naming_convention() {
        assert_eq!(output_file_name("countwords"), "countwords_output.txt");
    }

    #[test]
    fn basename_strips_directories() {
        assert_eq!(basename("/tmp/jobs/countwords"), "countwords");
        assert_eq!(basename("countwords"), "countwords");
    }
}
