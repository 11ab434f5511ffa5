//! Single-flight modal dialog presentation.
//!
//! [`DialogPresenter`] owns the one dialog slot of the session. A second
//! `present` while a dialog is open is rejected, and the proximity monitor
//! consults the same presenter (through [`DialogSlot`]) before firing any
//! handler, so dialogs never stack.

use std::sync::{Arc, Mutex};

use sanctuary_core::{
    Dialog, DialogOutcome, DialogSlot, HandlerError, ProximityHandler, ProximityHit,
};

use crate::events::{DialogEvent, EventBus};
use crate::utils::lock;

/// Renders dialogs on the host's UI.
pub trait DialogRenderer: Send + Sync {
    fn show(&self, dialog: &Dialog);
    fn hide(&self, dialog_id: &str);
}

/// Renderer that only logs, for headless hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDialogRenderer;

impl DialogRenderer for TracingDialogRenderer {
    fn show(&self, dialog: &Dialog) {
        tracing::info!("dialog {}: {} - {}", dialog.id, dialog.title, dialog.body);
    }

    fn hide(&self, dialog_id: &str) {
        tracing::debug!("dialog {} hidden", dialog_id);
    }
}

type CloseCallback = Box<dyn FnOnce(DialogOutcome) + Send>;

struct OpenDialog {
    dialog: Dialog,
    on_close: CloseCallback,
}

#[derive(Clone)]
pub struct DialogPresenter {
    inner: Arc<Inner>,
}

struct Inner {
    current: Mutex<Option<OpenDialog>>,
    renderer: Arc<dyn DialogRenderer>,
    events: EventBus,
}

impl DialogPresenter {
    pub fn new(renderer: Arc<dyn DialogRenderer>, events: EventBus) -> Self {
        Self {
            inner: Arc::new(Inner {
                current: Mutex::new(None),
                renderer,
                events,
            }),
        }
    }

    /// Presents `dialog` unless another one is open.
    ///
    /// `on_close` runs exactly once, with the chosen option or
    /// [`DialogOutcome::Dismissed`]. Returns `false` (and drops `on_close`
    /// without calling it) when the slot is taken.
    pub fn present(
        &self,
        dialog: Dialog,
        on_close: impl FnOnce(DialogOutcome) + Send + 'static,
    ) -> bool {
        {
            let mut current = lock(&self.inner.current);
            if let Some(open) = current.as_ref() {
                tracing::debug!(
                    "Rejecting dialog {}: {} is already open",
                    dialog.id,
                    open.dialog.id
                );
                self.inner.events.publish(DialogEvent::Rejected {
                    dialog_id: dialog.id,
                });
                return false;
            }
            *current = Some(OpenDialog {
                dialog: dialog.clone(),
                on_close: Box::new(on_close),
            });
        }

        self.inner.renderer.show(&dialog);
        self.inner.events.publish(DialogEvent::Opened {
            dialog_id: dialog.id,
        });
        true
    }

    /// Picks choice `index` of the open dialog and closes it.
    ///
    /// Returns `None` if no dialog is open or `index` is out of range; the
    /// dialog then stays open.
    pub fn choose(&self, index: usize) -> Option<DialogOutcome> {
        let (open, outcome) = {
            let mut current = lock(&self.inner.current);
            let key = current.as_ref()?.dialog.choice(index)?.key.clone();
            (current.take()?, DialogOutcome::Chosen { index, key })
        };
        Some(self.finish(open, outcome))
    }

    /// Dismisses the open dialog. Returns `false` if none was open.
    pub fn close(&self) -> bool {
        let Some(open) = lock(&self.inner.current).take() else {
            return false;
        };
        self.finish(open, DialogOutcome::Dismissed);
        true
    }

    pub fn is_open(&self) -> bool {
        lock(&self.inner.current).is_some()
    }

    /// The dialog currently presented, if any.
    pub fn current(&self) -> Option<Dialog> {
        lock(&self.inner.current)
            .as_ref()
            .map(|open| open.dialog.clone())
    }

    // Runs with the slot already released, so `on_close` may present again.
    fn finish(&self, open: OpenDialog, outcome: DialogOutcome) -> DialogOutcome {
        let OpenDialog { dialog, on_close } = open;
        self.inner.renderer.hide(&dialog.id);
        tracing::debug!("dialog {} closed: {:?}", dialog.id, outcome);

        on_close(outcome.clone());
        self.inner.events.publish(DialogEvent::Closed {
            dialog_id: dialog.id,
            outcome: outcome.clone(),
        });
        outcome
    }
}

impl DialogSlot for DialogPresenter {
    fn is_open(&self) -> bool {
        DialogPresenter::is_open(self)
    }
}

/// Proximity handler that presents a dialog when its target fires.
pub struct DialogTrigger {
    presenter: DialogPresenter,
    dialog: Dialog,
}

impl DialogTrigger {
    pub fn new(presenter: DialogPresenter, dialog: Dialog) -> Self {
        Self { presenter, dialog }
    }
}

impl ProximityHandler for DialogTrigger {
    fn handle(&mut self, hit: &ProximityHit) -> Result<(), HandlerError> {
        let target_id = hit.target_id.clone();
        let presented = self.presenter.present(self.dialog.clone(), move |outcome| {
            tracing::info!("{}: {:?}", target_id, outcome);
        });

        if presented {
            Ok(())
        } else {
            Err(HandlerError::new(format!(
                "dialog {} not shown: another dialog is open",
                self.dialog.id
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingRenderer {
        shown: AtomicUsize,
        hidden: AtomicUsize,
    }

    impl DialogRenderer for CountingRenderer {
        fn show(&self, _dialog: &Dialog) {
            self.shown.fetch_add(1, Ordering::SeqCst);
        }

        fn hide(&self, _dialog_id: &str) {
            self.hidden.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn shrine() -> Dialog {
        Dialog::new("shrine", "Shrine", "Rest here?")
            .with_choice("rest", "Rest")
            .and_then(|d| d.with_choice("leave", "Leave"))
            .unwrap()
    }

    #[test]
    fn test_second_present_is_rejected() {
        let renderer = Arc::new(CountingRenderer::default());
        let presenter = DialogPresenter::new(renderer.clone(), EventBus::new());

        assert!(presenter.present(shrine(), |_| {}));
        assert!(!presenter.present(Dialog::new("other", "Other", ""), |_| {}));

        assert_eq!(renderer.shown.load(Ordering::SeqCst), 1);
        assert_eq!(presenter.current().map(|d| d.id), Some("shrine".to_string()));
    }

    #[test]
    fn test_choose_invokes_callback_once() {
        let presenter = DialogPresenter::new(Arc::new(TracingDialogRenderer), EventBus::new());
        let calls = Arc::new(Mutex::new(Vec::new()));

        let sink = calls.clone();
        presenter.present(shrine(), move |outcome| sink.lock().unwrap().push(outcome));

        assert_eq!(presenter.choose(7), None);
        assert!(presenter.is_open());

        let outcome = presenter.choose(1);
        assert_eq!(
            outcome,
            Some(DialogOutcome::Chosen {
                index: 1,
                key: "leave".to_string()
            })
        );
        assert!(!presenter.is_open());
        assert_eq!(presenter.choose(0), None);
        assert!(!presenter.close());
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_close_dismisses_and_frees_slot() {
        let renderer = Arc::new(CountingRenderer::default());
        let presenter = DialogPresenter::new(renderer.clone(), EventBus::new());
        let dismissed = Arc::new(Mutex::new(None));

        let sink = dismissed.clone();
        presenter.present(shrine(), move |outcome| *sink.lock().unwrap() = Some(outcome));
        assert!(presenter.close());

        assert_eq!(*dismissed.lock().unwrap(), Some(DialogOutcome::Dismissed));
        assert_eq!(renderer.hidden.load(Ordering::SeqCst), 1);
        assert!(presenter.present(shrine(), |_| {}));
    }

    #[test]
    fn test_callback_may_present_next_dialog() {
        let presenter = DialogPresenter::new(Arc::new(TracingDialogRenderer), EventBus::new());

        let chained = presenter.clone();
        presenter.present(shrine(), move |_| {
            chained.present(Dialog::new("follow_up", "Later", ""), |_| {});
        });
        presenter.close();

        assert_eq!(presenter.current().map(|d| d.id), Some("follow_up".to_string()));
    }

    #[test]
    fn test_trigger_fails_while_slot_taken() {
        let presenter = DialogPresenter::new(Arc::new(TracingDialogRenderer), EventBus::new());
        let mut trigger = DialogTrigger::new(presenter.clone(), shrine());
        let hit = ProximityHit {
            target_id: "shrine".to_string(),
            distance_m: 3.0,
        };

        assert!(trigger.handle(&hit).is_ok());
        assert!(trigger.handle(&hit).is_err());
        assert!(presenter.is_open());
    }
}
