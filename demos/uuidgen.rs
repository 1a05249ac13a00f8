//! Simple command that prints one or '-n count' UUID strings of '-v version' (4, 7, or 8)

use std::{env, io, io::Write, process::ExitCode};

#[derive(Default)]
struct Opts {
    count: Option<usize>,
    version: Option<u8>,
}

fn main() -> io::Result<ExitCode> {
    let opts = {
        let mut args = env::args();
        let program = args.next();
        match parse_args(args) {
            Ok(opts) => opts,
            Err(message) => {
                eprintln!("Error: {}", message);
                eprintln!(
                    "Usage: {} [-n count] [-v version]",
                    program.as_deref().unwrap_or("uuidgen")
                );
                return Ok(ExitCode::FAILURE);
            }
        }
    };

    if let Err(err) = uuid478::set_version(opts.version.unwrap_or(7)) {
        eprintln!("Error: {}", err);
        return Ok(ExitCode::FAILURE);
    }

    let mut buf = io::BufWriter::new(io::stdout());
    for _ in 0..opts.count.unwrap_or(1) {
        writeln!(buf, "{}", uuid478::new_uuid())?;
    }

    Ok(ExitCode::SUCCESS)
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Opts, String> {
    let mut opts = Opts::default();
    while let Some(arg) = args.next() {
        let name = match arg.as_str() {
            "-n" => 'n',
            "-v" => 'v',
            _ => return Err(format!("unrecognized argument '{}'", arg)),
        };
        let Some(value) = args.next() else {
            return Err(format!("argument to option '{}' missing", name));
        };
        let already_given = match name {
            'n' => opts.count.replace(parse_value(name, &value)?).is_some(),
            _ => opts.version.replace(parse_value(name, &value)?).is_some(),
        };
        if already_given {
            return Err(format!("option '{}' given more than once", name));
        }
    }
    Ok(opts)
}

fn parse_value<T: std::str::FromStr>(name: char, value: &str) -> Result<T, String> {
    value
        .parse()
        .map_err(|_| format!("invalid argument to option '{}': '{}'", name, value))
}
