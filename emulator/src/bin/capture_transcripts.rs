use std::io;

#[allow(dead_code)]
#[path = "../session.rs"]
mod session;

use session::{Session, TranscriptProfile};

fn main() -> io::Result<()> {
    record_profile(TranscriptProfile::SinglePress)?;
    record_profile(TranscriptProfile::MasterPreempt)?;
    record_profile(TranscriptProfile::LongPressCancel)?;
    Ok(())
}

fn record_profile(profile: TranscriptProfile) -> io::Result<()> {
    let mut session = Session::for_profile(profile)?;
    match profile {
        TranscriptProfile::SinglePress => record_single_press(&mut session),
        TranscriptProfile::MasterPreempt => record_master_preempt(&mut session),
        TranscriptProfile::LongPressCancel => record_long_press(&mut session),
    }
}

fn record_single_press(session: &mut Session) -> io::Result<()> {
    let _ = session.handle_command("send init")?;
    let _ = session.handle_command("tap a 100")?;
    let _ = session.handle_command("advance 3000")?;
    let _ = session.handle_command("status")?;
    let _ = session.handle_command("advance 1800000 10")?;
    let _ = session.handle_command("status")?;
    Ok(())
}

fn record_master_preempt(session: &mut Session) -> io::Result<()> {
    let _ = session.handle_command("tap a 100")?;
    let _ = session.handle_command("advance 9898")?;
    let _ = session.handle_command("send master on")?;
    let _ = session.handle_command("advance 1")?;
    let _ = session.handle_command("status")?;
    let _ = session.handle_command("advance 1803000 10")?;
    let _ = session.handle_command("status")?;
    let _ = session.handle_command("advance 1803000 10")?;
    let _ = session.handle_command("status")?;
    Ok(())
}

fn record_long_press(session: &mut Session) -> io::Result<()> {
    let _ = session.handle_command("tap a 100")?;
    let _ = session.handle_command("advance 9899")?;
    let _ = session.handle_command("status")?;
    let _ = session.handle_command("tap a 3200")?;
    let _ = session.handle_command("status")?;
    Ok(())
}
