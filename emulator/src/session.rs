use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use boiler_core::channel::{ALL_CHANNELS, CHANNEL_COUNT, ChannelId};
use boiler_core::config::{Config, PinMap};
use boiler_core::controller::{Controller, TickReport};
use boiler_core::input::PinLevel;
use boiler_core::platform::{Level, OutputLine, Platform};
use boiler_core::scheduler::Phase;
use boiler_core::time::Millis;

/// Hold time used by `tap` when none is given.
const DEFAULT_TAP_MS: u32 = 100;

pub const HELP_TOPICS: &[(&str, &str)] = &[
    ("press", "press <ch>                 - hold a button down (one tick)"),
    ("release", "release <ch>               - let a button go (one tick)"),
    (
        "tap",
        "tap <ch> [ms]              - press, hold for ms (default 100), release",
    ),
    (
        "advance",
        "advance <ms> [step-ms]     - run the loop for ms, ticking every step-ms",
    ),
    ("send", "send <line>                - deliver a serial line to the controller"),
    ("status", "status                     - show queue, phase, and outputs"),
    ("help", "help [topic]               - show help for a command"),
];

/// Scripted sessions written by `capture_transcripts`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TranscriptProfile {
    SinglePress,
    MasterPreempt,
    LongPressCancel,
}

impl TranscriptProfile {
    pub fn log_path(self) -> &'static str {
        match self {
            TranscriptProfile::SinglePress => "evidence/emulator-single-press.log",
            TranscriptProfile::MasterPreempt => "evidence/emulator-master-preempt.log",
            TranscriptProfile::LongPressCancel => "evidence/emulator-long-press.log",
        }
    }

    pub fn header(self) -> &'static str {
        match self {
            TranscriptProfile::SinglePress => "Boiler emulator single short press transcript",
            TranscriptProfile::MasterPreempt => "Boiler emulator master preemption transcript",
            TranscriptProfile::LongPressCancel => "Boiler emulator long-press cancel transcript",
        }
    }
}

/// Simulated board: button levels, output levels, and the serial wire.
#[derive(Debug, Default)]
pub struct SimPlatform {
    now: u32,
    pressed: [bool; CHANNEL_COUNT],
    control: [Level; CHANNEL_COUNT],
    operation: [Level; CHANNEL_COUNT],
    rx: VecDeque<u8>,
    tx: Vec<(u32, String)>,
}

impl SimPlatform {
    pub fn control(&self, channel: ChannelId) -> Level {
        self.control[channel.as_index()]
    }

    pub fn operation(&self, channel: ChannelId) -> Level {
        self.operation[channel.as_index()]
    }

    pub fn is_pressed(&self, channel: ChannelId) -> bool {
        self.pressed[channel.as_index()]
    }
}

impl Platform for SimPlatform {
    fn sample(&mut self, channel: ChannelId) -> PinLevel {
        PinLevel::from_active_low(!self.pressed[channel.as_index()])
    }

    fn drive(&mut self, channel: ChannelId, line: OutputLine, level: Level) {
        match line {
            OutputLine::Control => self.control[channel.as_index()] = level,
            OutputLine::Operation => self.operation[channel.as_index()] = level,
        }
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }

    fn transmit(&mut self, line: &[u8]) {
        let text = String::from_utf8_lossy(line).trim_end().to_string();
        self.tx.push((self.now, text));
    }
}

pub struct Session {
    controller: Controller,
    platform: SimPlatform,
    now: u32,
    transcript: Option<TranscriptLogger>,
}

impl Session {
    /// Boots the controller; `transcript` mirrors every exchange to a file.
    pub fn new(transcript: Option<&Path>) -> io::Result<Self> {
        let transcript = transcript
            .map(|path| TranscriptLogger::new(path, "Boiler emulator transcript"))
            .transpose()?;
        Ok(Self::boot(transcript))
    }

    pub fn for_profile(profile: TranscriptProfile) -> io::Result<Self> {
        let logger = TranscriptLogger::new(Path::new(profile.log_path()), profile.header())?;
        Ok(Self::boot(Some(logger)))
    }

    fn boot(transcript: Option<TranscriptLogger>) -> Self {
        let mut controller = Controller::new(Config::new(), PinMap::DEFAULT);
        let mut platform = SimPlatform::default();
        controller.boot(&mut platform);
        Self {
            controller,
            platform,
            now: 0,
            transcript,
        }
    }

    pub fn now(&self) -> u32 {
        self.now
    }

    pub fn platform(&self) -> &SimPlatform {
        &self.platform
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn handle_command(&mut self, line: &str) -> io::Result<Vec<String>> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        let started = self.now;
        if let Some(transcript) = self.transcript.as_mut() {
            transcript.append_line(started, TranscriptRole::Host, trimmed)?;
        }

        let lines = match self.execute(trimmed) {
            Ok(lines) => lines,
            Err(message) => vec![format!("ERR {message}")],
        };

        if let Some(transcript) = self.transcript.as_mut() {
            for line in &lines {
                transcript.append_line(self.now, TranscriptRole::Emulator, line)?;
            }
        }
        Ok(lines)
    }

    fn execute(&mut self, line: &str) -> Result<Vec<String>, String> {
        let (keyword, rest) = line.split_once(' ').unwrap_or((line, ""));
        let mut args = rest.split_whitespace();

        match keyword.to_ascii_lowercase().as_str() {
            "press" => {
                let channel = parse_channel(args.next())?;
                self.platform.pressed[channel.as_index()] = true;
                Ok(self.step(1))
            }
            "release" => {
                let channel = parse_channel(args.next())?;
                self.platform.pressed[channel.as_index()] = false;
                Ok(self.step(1))
            }
            "tap" => {
                let channel = parse_channel(args.next())?;
                let hold = parse_millis(args.next(), "hold", DEFAULT_TAP_MS)?;
                self.platform.pressed[channel.as_index()] = true;
                let mut lines = self.step(1);
                lines.extend(self.run_for(hold.saturating_sub(1), 1));
                self.platform.pressed[channel.as_index()] = false;
                lines.extend(self.step(1));
                Ok(lines)
            }
            "advance" => {
                let duration = parse_millis(args.next(), "duration", 0)?;
                let step = parse_millis(args.next(), "step", 1)?.max(1);
                Ok(self.run_for(duration, step))
            }
            "send" => {
                if rest.is_empty() {
                    return Err("send expects a serial line".to_string());
                }
                self.platform.rx.extend(rest.bytes());
                self.platform.rx.push_back(b'\n');
                Ok(self.step(1))
            }
            "status" => Ok(self.describe_status()),
            "help" => Ok(help_lines(args.next())),
            other => Err(format!("unknown command `{other}` (try `help`)")),
        }
    }

    /// Advances time by `elapsed` ms and runs one tick.
    fn step(&mut self, elapsed: u32) -> Vec<String> {
        self.now = self.now.wrapping_add(elapsed);
        self.platform.now = self.now;
        let report = self.controller.tick(Millis::new(self.now), &mut self.platform);
        self.narrate(&report)
    }

    fn run_for(&mut self, duration: u32, step: u32) -> Vec<String> {
        let mut lines = Vec::new();
        let mut remaining = duration;
        while remaining > 0 {
            let elapsed = step.min(remaining);
            lines.extend(self.step(elapsed));
            remaining -= elapsed;
        }
        lines
    }

    fn narrate(&mut self, report: &TickReport) -> Vec<String> {
        let mut lines = Vec::new();
        for handled in &report.events {
            lines.push(format!(
                "[{:>9} ms] {:?} -> {:?}{}",
                self.now,
                handled.event,
                handled.disposition,
                if handled.synthetic { " (serial)" } else { "" }
            ));
        }
        for (at, text) in self.platform.tx.drain(..) {
            lines.push(format!("[{at:>9} ms] <- {text}"));
        }
        lines
    }

    fn describe_status(&self) -> Vec<String> {
        let scheduler = self.controller.scheduler();
        let phase = match scheduler.phase() {
            Phase::Idle => "idle".to_string(),
            Phase::Settling { since } => format!(
                "settling {} since {since} ms",
                scheduler.current().label()
            ),
            Phase::Running { since } => {
                format!("running {} since {since} ms", scheduler.current().label())
            }
        };

        let mut lines = vec![
            format!("time {} ms", self.now),
            format!("timer {} min", self.controller.config().operation_minutes()),
            format!("phase {phase}"),
            format!("{} {:?}", scheduler.queue(), scheduler.queue().slots()),
        ];

        for channel in ALL_CHANNELS {
            let pins = self.controller.pins().pins(channel);
            let button = self.controller.inputs().button(channel);
            let last_press = button
                .last_press()
                .map_or_else(|| "never".to_string(), |at| format!("{at} ms"));
            lines.push(format!(
                "{:<6} button {:<8} control(pin {}) {:<3} operation(pin {}) {:<3} queued {} last press {}",
                channel.label(),
                if self.platform.is_pressed(channel) {
                    "pressed"
                } else {
                    "released"
                },
                pins.control,
                self.platform.control(channel),
                pins.operation,
                self.platform.operation(channel),
                scheduler.is_queued(channel),
                last_press,
            ));
        }
        lines
    }
}

fn parse_channel(arg: Option<&str>) -> Result<ChannelId, String> {
    let arg = arg.ok_or_else(|| "expected a channel (master|a|b|c or 0..3)".to_string())?;
    ChannelId::from_label(arg).ok_or_else(|| format!("unknown channel `{arg}`"))
}

fn parse_millis(arg: Option<&str>, what: &str, default: u32) -> Result<u32, String> {
    match arg {
        None => Ok(default),
        Some(text) => text
            .trim_end_matches("ms")
            .parse::<u32>()
            .map_err(|_| format!("invalid {what} `{text}`")),
    }
}

fn help_lines(topic: Option<&str>) -> Vec<String> {
    let mut lines = Vec::new();
    match topic {
        Some(target) => {
            if let Some((_, detail)) = HELP_TOPICS
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(target))
            {
                lines.push((*detail).to_string());
            } else {
                lines.push(format!("No help available for `{target}`."));
                lines.push(format!("Available topics: {}", help_topic_list()));
            }
        }
        None => {
            lines.push("Available commands:".to_string());
            for (_, detail) in HELP_TOPICS {
                lines.push(format!("  {detail}"));
            }
            lines.push("Channels: master|a|b|c or 0..3. `exit` or `quit` leaves.".to_string());
        }
    }
    lines
}

fn help_topic_list() -> String {
    HELP_TOPICS
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

struct TranscriptLogger {
    writer: BufWriter<std::fs::File>,
}

impl TranscriptLogger {
    fn new(path: &Path, header: &str) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut logger = Self {
            writer: BufWriter::new(file),
        };

        logger.write_header(header)?;
        Ok(logger)
    }

    fn write_header(&mut self, header: &str) -> io::Result<()> {
        writeln!(self.writer, "# {header}")?;
        writeln!(
            self.writer,
            "# Timestamps are simulated milliseconds since boot"
        )?;
        writeln!(self.writer)?;
        self.writer.flush()
    }

    fn append_line(&mut self, at_ms: u32, role: TranscriptRole, line: &str) -> io::Result<()> {
        writeln!(self.writer, "[+{at_ms:>9} ms] {} {line}", role.prefix())?;
        self.writer.flush()
    }
}

enum TranscriptRole {
    Host,
    Emulator,
}

impl TranscriptRole {
    fn prefix(&self) -> &'static str {
        match self {
            TranscriptRole::Host => "HOST>",
            TranscriptRole::Emulator => "EMU <",
        }
    }
}

/// Resolves `--transcript <path>` / `--transcript=<path>`.
pub fn parse_transcript_arg<I>(mut args: I) -> Result<Option<PathBuf>, String>
where
    I: Iterator<Item = String>,
{
    let Some(arg) = args.next() else {
        return Ok(None);
    };

    let path = if let Some(value) = arg.strip_prefix("--transcript=") {
        value.to_string()
    } else if arg == "--transcript" {
        args.next()
            .ok_or_else(|| "Expected value after --transcript".to_string())?
    } else {
        return Err(format!("Unknown argument `{arg}`"));
    };

    if let Some(extra) = args.next() {
        return Err(format!("Unexpected argument `{extra}`"));
    }
    Ok(Some(PathBuf::from(path)))
}
