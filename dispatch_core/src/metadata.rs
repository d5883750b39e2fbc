use crate::error::Error;

fn next_field<'a>(fields: &mut std::str::SplitWhitespace<'a>, what: &str) -> Result<&'a str, Error> {
    fields
        .next()
        .ok_or_else(|| Error::Protocol(format!("missing {} field", what)))
}

fn parse_usize(field: &str, what: &str) -> Result<usize, Error> {
    field
        .parse()
        .map_err(|_| Error::Protocol(format!("malformed {}: {:?}", what, field)))
}

/// Client→Master submission metadata: `"<exe_name> <exe_size> <in_name> <in_size>"`.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitMeta {
    pub exe_name: String,
    pub exe_size: usize,
    pub in_name: String,
    pub in_size: usize,
}

impl SubmitMeta {
    pub fn render(&self) -> String {
        format!(
            "{} {} {} {}",
            self.exe_name, self.exe_size, self.in_name, self.in_size
        )
    }

    pub fn parse(line: &str) -> Result<Self, Error> {
        let mut fields = line.split_whitespace();
        let exe_name = next_field(&mut fields, "exe_name")?.to_string();
        let exe_size = parse_usize(next_field(&mut fields, "exe_size")?, "exe_size")?;
        let in_name = next_field(&mut fields, "in_name")?.to_string();
        let in_size = parse_usize(next_field(&mut fields, "in_size")?, "in_size")?;
        Ok(SubmitMeta {
            exe_name,
            exe_size,
            in_name,
            in_size,
        })
    }
}

/// Master→Worker dispatch metadata: `"<exe_name> <exe_size> <in_name> <in_size> <command>"`.
///
/// The command is everything after the fourth field, so it may itself
/// contain spaces (e.g. `./countwords input.txt`).
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchMeta {
    pub exe_name: String,
    pub exe_size: usize,
    pub in_name: String,
    pub in_size: usize,
    pub command: String,
}

impl DispatchMeta {
    pub fn render(&self) -> String {
        format!(
            "{} {} {} {} {}",
            self.exe_name, self.exe_size, self.in_name, self.in_size, self.command
        )
    }

    pub fn parse(line: &str) -> Result<Self, Error> {
        let mut fields = line.splitn(5, ' ');
        let exe_name = next_field_str(&mut fields, "exe_name")?.to_string();
        let exe_size = parse_usize(next_field_str(&mut fields, "exe_size")?, "exe_size")?;
        let in_name = next_field_str(&mut fields, "in_name")?.to_string();
        let in_size = parse_usize(next_field_str(&mut fields, "in_size")?, "in_size")?;
        let command = next_field_str(&mut fields, "command")?.to_string();
        Ok(DispatchMeta {
            exe_name,
            exe_size,
            in_name,
            in_size,
            command,
        })
    }
}

fn next_field_str<'a>(
    fields: &mut std::str::SplitN<'a, char>,
    what: &str,
) -> Result<&'a str, Error> {
    fields
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::Protocol(format!("missing {} field", what)))
}

/// Worker→Master and Master→Client output metadata: `"<out_name> <out_size>"`.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputMeta {
    pub name: String,
    pub size: usize,
}

impl OutputMeta {
    pub fn render(&self) -> String {
        format!("{} {}", self.name, self.size)
    }

    pub fn parse(line: &str) -> Result<Self, Error> {
        let mut fields = line.split_whitespace();
        let name = next_field(&mut fields, "out_name")?.to_string();
        let size = parse_usize(next_field(&mut fields, "out_size")?, "out_size")?;
        Ok(OutputMeta { name, size })
    }
}

/// Worker→Master utilization push: `"<slave_id> <utilization>"`.
#[derive(Debug, Clone, PartialEq)]
pub struct UtilMeta {
    pub worker_id: u32,
    pub value: f64,
}

impl UtilMeta {
    pub fn render(&self) -> String {
        format!("{} {}", self.worker_id, self.value)
    }

    pub fn parse(line: &str) -> Result<Self, Error> {
        let mut fields = line.split_whitespace();
        let worker_id = next_field(&mut fields, "slave_id")?
            .parse()
            .map_err(|_| Error::Protocol(format!("malformed slave id in {:?}", line)))?;
        let value = next_field(&mut fields, "utilization")?
            .parse()
            .map_err(|_| Error::Protocol(format!("malformed utilization in {:?}", line)))?;
        Ok(UtilMeta { worker_id, value })
    }
}
