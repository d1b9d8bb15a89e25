use eyre::{
    Result,
    WrapErr,
};
use structopt::StructOpt as _;

use rs485bus::{
    bootstrap,
    direction::NoDirection,
    transport::SerialTransport,
    Address,
    BusDirection,
    Error,
    Node,
    SystemClock,
    Wait,
};

pub use crate::options::Options;
use crate::options::Command;

mod options;

type Console = Node<SerialTransport, Box<dyn BusDirection>, SystemClock>;

fn main() -> Result<()> {
    bootstrap!("starting {} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let options: Options = Options::from_args();
    rs485bus::trace::init(options.pretty);

    let config = options.config();
    tracing::info!(?config, port = %options.serial_port, baud = options.baud, "opening bus");

    let transport = SerialTransport::open(&options.serial_port, options.baud)
        .wrap_err_with(|| format!("opening {}", options.serial_port))?;

    let direction: Box<dyn BusDirection> = if config.direction_pin != 0 {
        Box::new(transport.rts_direction()?)
    } else {
        Box::new(NoDirection)
    };

    let mut node: Console = Node::new(transport, direction, SystemClock::new(), &config);
    node.begin(config.address)?;

    match options.command {
        Command::Send {
            to,
            hex,
            data,
        } => {
            let data = if hex { hex::decode(&data)? } else { data.into_bytes() };
            let sent = node.send_to(Address::new(to), &data)?;

            tracing::info!(sent, to = %Address::new(to).display(), "packet sent");
        },

        Command::Listen {
            from,
            count,
        } => listen(&mut node, from.map(Address::new), count)?,

        Command::Raw {
            body,
        } => {
            let body = hex::decode(&body)?;
            let stuffed = node.phy_mut().send(&body)?;

            tracing::info!(body = body.len(), stuffed, "raw frame sent");
        },
    }

    Ok(())
}

fn listen(node: &mut Console, from: Option<Address>, count: Option<usize>) -> Result<()> {
    let mut buf = vec![0u8; node.max_payload()];
    let mut received = 0;

    while count.map_or(true, |count| received < count) {
        let result = match from {
            Some(from) => {
                node.receive_from(&mut buf, from, Wait::BLOCK).map(|len| len.map(|len| (len, from)))
            },
            None => node.receive(&mut buf, Wait::BLOCK).map(|p| p.map(|p| (p.len, p.source))),
        };

        let (len, source) = match result {
            Ok(Some(packet)) => packet,
            Ok(None) | Err(Error::Timeout(_)) => continue,
            Err(e) => {
                tracing::warn!(error = %e, "receive failed");
                continue;
            },
        };

        let data = &buf[..len];
        received += 1;

        match std::str::from_utf8(data) {
            Ok(text) => println!("{}: {text:?}", source.display()),
            Err(_) => println!("{}: {}", source.display(), hex::encode(data)),
        }
    }

    Ok(())
}
