/// Fixed control-message frame size, in bytes. Tokens are parsed by
/// scanning up to the first space or NUL within this many bytes.
pub const MSG: usize = 100;

/// Bulk-payload frame size, in bytes. The final chunk of a transfer is
/// `size mod B` bytes when that remainder is nonzero.
pub const B: usize = 1000;

/// Upper bound (exclusive), in seconds, on the random sleep a Worker takes
/// between `UtilizationReporter` ticks.
pub const MAX_SLEEP_SECS: u64 = 10;

/// Default Worker registration listener port (REG).
pub const REG_PORT: u16 = 8081;

/// Default Client submission listener port (SUB).
pub const SUB_PORT: u16 = 8082;

/// Default Worker utilization listener port (UTIL).
pub const UTIL_PORT: u16 = 8083;

/// Default Worker job listener port (EXEC), bound on the Worker itself.
pub const EXEC_PORT: u16 = 8084;

/// Default registry capacity and TCP accept backlog. The original C
/// implementation reused a single `MAX_BACKLOG` constant for both; this
/// implementation keeps them distinct so a reader never has to guess which
/// meaning is in play at a given call site.
pub const N_MAX: usize = 100;
pub const BACKLOG: u32 = 100;

/// Process-wide tunables. Defaults match the constants above; tests
/// construct a `Config` directly to bind ephemeral ports and shrink
/// capacities.
#[derive(Debug, Clone)]
pub struct Config {
    pub reg_port: u16,
    pub sub_port: u16,
    pub util_port: u16,
    pub exec_port: u16,
    pub registry_capacity: usize,
    pub backlog: u32,
    /// Upper bound on Dispatcher retries per job; `None` means unbounded,
    /// matching the base design in spec §4.5. Implementations are
    /// encouraged to set this; tests always do so a stuck dispatch doesn't
    /// hang forever.
    pub dispatch_max_attempts: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            reg_port: REG_PORT,
            sub_port: SUB_PORT,
            util_port: UTIL_PORT,
            exec_port: EXEC_PORT,
            registry_capacity: N_MAX,
            backlog: BACKLOG,
            dispatch_max_attempts: None,
        }
    }
}
