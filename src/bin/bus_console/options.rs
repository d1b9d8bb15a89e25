use rs485bus::{
    Address,
    Config,
    Scheme,
    Turnaround,
};

#[derive(Debug, Clone, PartialEq, Eq, structopt::StructOpt)]
pub struct Options {
    #[structopt(short, long, required = true)]
    pub serial_port: String,

    #[structopt(short, long, default_value = "115200")]
    pub baud: u32,

    /// This node's bus address.
    #[structopt(short, long, default_value = "0")]
    pub address: u8,

    #[structopt(long, default_value = "64")]
    pub max_payload: usize,

    /// `cobs` or `slip`.
    #[structopt(long, default_value = "slip")]
    pub scheme: Scheme,

    /// Nonzero to drive transceiver direction with the port's RTS line.
    #[structopt(long, default_value = "0")]
    pub direction_pin: u8,

    #[structopt(long, default_value = "1000")]
    pub timeout_ms: u64,

    #[structopt(long)]
    pub pretty: bool,

    #[structopt(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, structopt::StructOpt)]
pub enum Command {
    /// Send one packet.
    Send {
        #[structopt(long)]
        to: u8,

        /// Interpret `data` as hex.
        #[structopt(long)]
        hex: bool,

        data: String,
    },

    /// Print packets as they arrive.
    Listen {
        /// Only accept packets from this address.
        #[structopt(long)]
        from: Option<u8>,

        /// Exit after this many packets.
        #[structopt(long)]
        count: Option<usize>,
    },

    /// Frame a hex-encoded body and write it without MAC or packet headers.
    Raw { body: String },
}

impl Options {
    pub fn config(&self) -> Config {
        Config {
            address:       Address::new(self.address),
            max_payload:   self.max_payload,
            scheme:        self.scheme,
            direction_pin: self.direction_pin,
            blocking:      false,
            timeout_ms:    self.timeout_ms,
            turnaround:    Turnaround::default(),
        }
    }
}
