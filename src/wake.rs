use chrono::{DateTime, Local};

#[derive(Debug, thiserror::Error)]
pub enum WakeError {
    #[error("failed to run the wake scheduler: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("wake scheduler failed: {0}")]
    Command(String),
}

/// pmset wants its timestamps as MM/DD/YYYY HH:MM:SS
#[cfg(any(test, target_os = "macos"))]
fn pmset_time(time: &DateTime<Local>) -> String {
    time.format("%m/%d/%Y %H:%M:%S").to_string()
}

#[cfg(any(test, target_os = "macos"))]
fn pmset_schedule_args(time: &DateTime<Local>) -> Vec<String> {
    vec!["schedule".to_string(), "wake".to_string(), pmset_time(time)]
}

#[cfg(any(test, target_os = "macos"))]
fn pmset_cancel_args(time: &DateTime<Local>) -> Vec<String> {
    vec![
        "schedule".to_string(),
        "cancel".to_string(),
        "wake".to_string(),
        pmset_time(time),
    ]
}

#[cfg(any(test, not(target_os = "macos")))]
fn rtcwake_schedule_args(time: &DateTime<Local>) -> Vec<String> {
    vec![
        "-m".to_string(),
        "no".to_string(),
        "-t".to_string(),
        time.timestamp().to_string(),
    ]
}

#[cfg(any(test, not(target_os = "macos")))]
fn rtcwake_cancel_args() -> Vec<String> {
    vec!["-m".to_string(), "disable".to_string()]
}

/// pmset needs root, macOS prompts for it through osascript
#[cfg(target_os = "macos")]
fn run_scheduler(command: &str, args: &[String]) -> Result<(), WakeError> {
    let full_command = format!("{} {}", command, args.join(" "));
    let output = std::process::Command::new("osascript")
        .arg("-e")
        .arg(format!(
            "do shell script \"{full_command}\" with administrator privileges"
        ))
        .output()?;
    if output.status.success() {
        Ok(())
    } else {
        // a cancelled auth dialog lands here as "User canceled."
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(WakeError::Command(stderr.trim().to_string()))
    }
}

#[cfg(not(target_os = "macos"))]
fn run_scheduler(command: &str, args: &[String]) -> Result<(), WakeError> {
    let output = std::process::Command::new(command).args(args).output()?;
    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(WakeError::Command(stderr.trim().to_string()))
    }
}

/// register a wake-from-sleep at `time` with the OS
pub fn schedule_wake(time: DateTime<Local>) -> Result<(), WakeError> {
    log::info!("registering system wake for {time}");
    #[cfg(target_os = "macos")]
    return run_scheduler("pmset", &pmset_schedule_args(&time));
    #[cfg(not(target_os = "macos"))]
    run_scheduler("rtcwake", &rtcwake_schedule_args(&time))
}

/// drop the wake registered for `time`
pub fn cancel_wake(time: DateTime<Local>) -> Result<(), WakeError> {
    log::info!("cancelling system wake for {time}");
    #[cfg(target_os = "macos")]
    return run_scheduler("pmset", &pmset_cancel_args(&time));
    #[cfg(not(target_os = "macos"))]
    run_scheduler("rtcwake", &rtcwake_cancel_args())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2030, 10, 27, 10, 0, 0).unwrap()
    }

    #[test]
    fn pmset_schedule_args_use_the_slash_date_format() {
        let args = pmset_schedule_args(&fixed_time());
        assert_eq!(args, vec!["schedule", "wake", "10/27/2030 10:00:00"]);
    }

    #[test]
    fn pmset_cancel_names_the_same_timestamp() {
        let args = pmset_cancel_args(&fixed_time());
        assert_eq!(args, vec!["schedule", "cancel", "wake", "10/27/2030 10:00:00"]);
    }

    #[test]
    fn rtcwake_schedule_passes_the_epoch() {
        let time = fixed_time();
        let args = rtcwake_schedule_args(&time);
        assert_eq!(args, vec!["-m".to_string(), "no".to_string(), "-t".to_string(), time.timestamp().to_string()]);
    }

    #[test]
    fn rtcwake_cancel_disables_the_pending_wake() {
        assert_eq!(rtcwake_cancel_args(), vec!["-m", "disable"]);
    }
}
