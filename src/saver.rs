use crate::preferences::PreferenceStore;
use crate::store::KeyValueStore;
use crate::theme::Theme;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use tracing::error;

/// Messages sent to the preference saver thread
pub enum PreferenceMessage {
    SetTheme(Theme),
    AddRecentFile(String),
    /// Stop the saver thread once earlier messages are applied
    Stop,
}

/// Applies preference writes on a background thread, one at a time and in the
/// order they were submitted, so the UI thread never waits on disk I/O.
///
/// Call `shutdown()` before exit: dropping the saver stops the thread without
/// waiting, and writes still queued at process exit are lost.
pub struct PreferenceSaver {
    sender: Sender<PreferenceMessage>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

impl PreferenceSaver {
    pub fn spawn<S>(preferences: Arc<PreferenceStore<S>>) -> Self
    where
        S: KeyValueStore + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        let thread_handle = thread::spawn(move || {
            Self::run(receiver, &*preferences);
        });

        Self {
            sender,
            thread_handle: Some(thread_handle),
        }
    }

    pub fn set_theme(&self, theme: Theme) {
        self.send(PreferenceMessage::SetTheme(theme));
    }

    pub fn add_recent_file(&self, path: impl Into<String>) {
        self.send(PreferenceMessage::AddRecentFile(path.into()));
    }

    /// Stop the thread and wait until every queued write has been applied
    pub fn shutdown(mut self) {
        self.send(PreferenceMessage::Stop);
        if let Some(handle) = self.thread_handle.take()
            && handle.join().is_err()
        {
            error!("Preference saver thread panicked");
        }
    }

    fn send(&self, message: PreferenceMessage) {
        if let Err(e) = self.sender.send(message) {
            error!("Failed to queue preference write: {}", e);
        }
    }

    fn run<S: KeyValueStore>(
        receiver: Receiver<PreferenceMessage>,
        preferences: &PreferenceStore<S>,
    ) {
        while let Ok(message) = receiver.recv() {
            match message {
                PreferenceMessage::SetTheme(theme) => preferences.set_theme(theme),
                PreferenceMessage::AddRecentFile(path) => preferences.add_recent_file(&path),
                PreferenceMessage::Stop => break,
            }
        }
    }
}

impl Drop for PreferenceSaver {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            let _ = self.sender.send(PreferenceMessage::Stop);
            // Not joined here to avoid blocking the caller; use `shutdown` to wait
        }
    }
}
