mod session;

use std::env;
use std::io::{self, BufRead, IsTerminal, Write};
use std::process;

use crossterm::style::Stylize;
use session::{Session, parse_transcript_arg};

fn main() -> io::Result<()> {
    let transcript = parse_transcript_arg(env::args().skip(1)).unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!("Usage: boiler-emulator [--transcript <path>]");
        process::exit(2);
    });

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let stdout = io::stdout();
    let styled = stdout.is_terminal();
    let mut writer = stdout.lock();
    let mut session = Session::new(transcript.as_deref())?;
    let mut line = String::new();

    writeln!(
        writer,
        "Boiler Controller Emulator ready. Type `help` for commands or `exit` to quit."
    )?;

    loop {
        line.clear();
        write!(writer, "{:>9} ms> ", session.now())?;
        writer.flush()?;

        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            writeln!(writer)?;
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if should_terminate(trimmed) {
            writeln!(writer, "Session closed.")?;
            break;
        }

        for response in session.handle_command(trimmed)? {
            if styled {
                writeln!(writer, "{}", style_response(response))?;
            } else {
                writeln!(writer, "{response}")?;
            }
        }
    }

    Ok(())
}

fn should_terminate(input: &str) -> bool {
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

fn style_response(line: String) -> crossterm::style::StyledContent<String> {
    if line.starts_with("ERR") {
        line.red()
    } else if line.ends_with(" on") && line.contains("<- led") {
        line.green()
    } else if line.contains("<- ") {
        line.cyan()
    } else {
        line.stylize()
    }
}
