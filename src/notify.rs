//! User-visible notices.
//!
//! Stores and clients report outcomes through a [`Notifier`] instead of
//! printing, so the terminal front-end, a log-only embedding and the tests
//! can each decide how notices surface.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

pub trait Notifier: Send + Sync {
    /// In-app notice.
    fn notify(&self, level: NoticeLevel, message: &str);

    /// Desktop-level notification. Callers only invoke this when the user
    /// has allowed desktop notifications.
    fn desktop(&self, _title: &str, _body: &str) {}
}

/// Routes notices into the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info | NoticeLevel::Success => log::info!("{message}"),
            NoticeLevel::Warning => log::warn!("{message}"),
            NoticeLevel::Error => log::error!("{message}"),
        }
    }
}

/// Hands a notification to the desktop notification daemon via `notify-send`.
pub fn show_desktop_notification(title: &str, body: &str) {
    spawn_reaped("notify-send", &["--app-name=ViewX", title, body]);
}

/// Starts `program` and waits for it on the runtime so the exited child is
/// reaped. Returns `None` outside a runtime or when the spawn fails.
fn spawn_reaped(
    program: &str,
    args: &[&str],
) -> Option<tokio::task::JoinHandle<Option<std::process::ExitStatus>>> {
    let handle = match tokio::runtime::Handle::try_current() {
        Ok(handle) => handle,
        Err(err) => {
            log::debug!("No runtime to run {program}: {err}");
            return None;
        }
    };
    let _guard = handle.enter();
    let mut child = match tokio::process::Command::new(program)
        .args(args)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
    {
        Ok(child) => child,
        Err(err) => {
            log::debug!("Desktop notification unavailable: {err}");
            return None;
        }
    };
    let program = program.to_string();
    Some(handle.spawn(async move {
        match child.wait().await {
            Ok(status) => Some(status),
            Err(err) => {
                log::debug!("Waiting on {program} failed: {err}");
                None
            }
        }
    }))
}


#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn helper_processes_are_waited_on() {
        let task = spawn_reaped("true", &[]).expect("spawned");
        let status = task.await.unwrap().expect("exit status");
        assert!(status.success());
    }

    #[tokio::test]
    async fn missing_helper_is_not_an_error() {
        assert!(spawn_reaped("viewx-no-such-helper", &["x"]).is_none());
        show_desktop_notification("title", "body");
    }

    #[test]
    fn outside_a_runtime_nothing_is_spawned() {
        assert!(spawn_reaped("true", &[]).is_none());
    }
}
