//! Log helpers for the control loop.
//!
//! On the MCU every helper goes through `defmt`; host builds print the same
//! text so the loop can be traced without a probe.

#![allow(dead_code)]

use boiler_core::controller::{HandledEvent, TickReport};
use boiler_core::input::PressEvent;
use boiler_core::scheduler::{Disposition, Scheduler, Transition};

/// Logs everything a tick reported, plus the queue dump when it changed.
pub fn tick_report(report: &TickReport, scheduler: &Scheduler) {
    for handled in &report.events {
        log_event(handled);
    }

    for transition in &report.transitions {
        let (phase, channel) = match transition {
            Transition::Settling(channel) => ("settling", channel),
            Transition::Started(channel) => ("running", channel),
            Transition::Completed(channel) => ("completed", channel),
        };
        emit_transition(phase, channel.label());
    }

    for command in &report.commands {
        emit_command(command);
    }

    for rejected in &report.rejected {
        emit_rejected(rejected);
    }

    if report.unrecorded > 0 {
        emit_unrecorded(report.unrecorded);
    }

    if report.queue_changed() {
        emit_queue(scheduler.queue().slots());
    }
}

fn log_event(handled: &HandledEvent) {
    let kind = match handled.event {
        PressEvent::Short(_) => "short",
        PressEvent::Long(_) => "long",
    };
    let source = if handled.synthetic { "serial" } else { "button" };
    emit_event(
        source,
        kind,
        handled.event.channel().label(),
        disposition_label(handled.disposition),
    );
}

const fn disposition_label(disposition: Disposition) -> &'static str {
    match disposition {
        Disposition::Queued => "queued",
        Disposition::Preempted { aborted: Some(_) } => "preempted",
        Disposition::Preempted { aborted: None } => "front",
        Disposition::Duplicate => "duplicate",
        Disposition::Full => "full",
        Disposition::Stopped => "stopped",
        Disposition::Removed => "removed",
        Disposition::NotQueued => "not-queued",
    }
}

#[cfg(target_os = "none")]
fn emit_event(source: &'static str, kind: &'static str, channel: &'static str, outcome: &'static str) {
    defmt::info!("input: {} {} press on {} -> {}", source, kind, channel, outcome);
}

#[cfg(not(target_os = "none"))]
fn emit_event(source: &'static str, kind: &'static str, channel: &'static str, outcome: &'static str) {
    println!("input: {source} {kind} press on {channel} -> {outcome}");
}

#[cfg(target_os = "none")]
fn emit_transition(phase: &'static str, channel: &'static str) {
    defmt::info!("scheduler: {} {}", channel, phase);
}

#[cfg(not(target_os = "none"))]
fn emit_transition(phase: &'static str, channel: &'static str) {
    println!("scheduler: {channel} {phase}");
}

#[cfg(target_os = "none")]
fn emit_queue(slots: [i8; 4]) {
    defmt::debug!("scheduler: queue {}", slots);
}

#[cfg(not(target_os = "none"))]
fn emit_queue(slots: [i8; 4]) {
    println!("scheduler: queue {slots:?}");
}

#[cfg(target_os = "none")]
fn emit_command(command: &boiler_core::serial::Command) {
    defmt::info!("serial: executed {}", defmt::Debug2Format(command));
}

#[cfg(not(target_os = "none"))]
fn emit_command(command: &boiler_core::serial::Command) {
    println!("serial: executed {command:?}");
}

#[cfg(target_os = "none")]
fn emit_rejected(error: &boiler_core::serial::CommandError) {
    defmt::debug!("serial: ignored line ({})", defmt::Display2Format(error));
}

#[cfg(not(target_os = "none"))]
fn emit_rejected(error: &boiler_core::serial::CommandError) {
    println!("serial: ignored line ({error})");
}

#[cfg(target_os = "none")]
fn emit_unrecorded(count: u32) {
    defmt::debug!("serial: {} more lines this tick", count);
}

#[cfg(not(target_os = "none"))]
fn emit_unrecorded(count: u32) {
    println!("serial: {count} more lines this tick");
}

/// Logs input and output lost since the previous tick.
///
/// `rx`/`tx` are the link's counters; `outbox` counts status lines the
/// controller could not buffer.
#[cfg(target_os = "none")]
pub fn overruns(rx: u32, tx: u32, outbox: u32) {
    if rx > 0 {
        defmt::warn!("serial: dropped {} received bytes", rx);
    }
    if tx > 0 {
        defmt::warn!("serial: dropped {} status lines", tx);
    }
    if outbox > 0 {
        defmt::warn!("control: outbox dropped {} status lines", outbox);
    }
}

#[cfg(not(target_os = "none"))]
pub fn overruns(rx: u32, tx: u32, outbox: u32) {
    if rx > 0 {
        println!("serial: dropped {rx} received bytes");
    }
    if tx > 0 {
        println!("serial: dropped {tx} status lines");
    }
    if outbox > 0 {
        println!("control: outbox dropped {outbox} status lines");
    }
}

#[cfg(target_os = "none")]
pub fn uart_error(direction: &'static str) {
    defmt::warn!("serial: UART {} error", direction);
}

#[cfg(not(target_os = "none"))]
pub fn uart_error(direction: &'static str) {
    println!("serial: UART {direction} error");
}
