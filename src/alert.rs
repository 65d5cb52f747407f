//! Modal alert dialog with a question / confirm / cancel protocol.
//!
//! A dialog is opened from a [`DialogRequest`] and hands back a
//! [`PendingDialog`], a future resolved exactly once by the first dismissing
//! interaction. Rendering is left to a host: [`AlertDialog::mount`] builds the
//! markup inside a [`Document`], the egui front end draws the same dialog as
//! a window.

use crate::dom::{Document, NodeId};
use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

/// Class of the full-screen backdrop that owns a mounted dialog.
pub const WRAPPER_CLASS: &str = "alert-wrapper";
pub const FRAME_CLASS: &str = "alert-frame";

const ICON_ERROR: &str = r##"<svg class="alert-img" xmlns="http://www.w3.org/2000/svg" fill="#fff" viewBox="0 0 52 52"><path d="M26 0C11.664 0 0 11.663 0 26s11.664 26 26 26 26-11.663 26-26S40.336 0 26 0zm0 50C12.767 50 2 39.233 2 26S12.767 2 26 2s24 10.767 24 24-10.767 24-24 24zm9.707-33.707a1 1 0 0 0-1.414 0L26 24.586l-8.293-8.293a1 1 0 0 0-1.414 1.414L24.586 26l-8.293 8.293a1 1 0 0 0 0 1.414c.195.195.451.293.707.293s.512-.098.707-.293L26 27.414l8.293 8.293c.195.195.451.293.707.293s.512-.098.707-.293a1 1 0 0 0 0-1.414L27.414 26l8.293-8.293a1 1 0 0 0 0-1.414z"/></svg>"##;
const ICON_SUCCESS: &str = r##"<svg class="alert-img" xmlns="http://www.w3.org/2000/svg" fill="#fff" viewBox="0 0 52 52"><path d="M26 0C11.664 0 0 11.663 0 26s11.664 26 26 26 26-11.663 26-26S40.336 0 26 0zm0 50C12.767 50 2 39.233 2 26S12.767 2 26 2s24 10.767 24 24-10.767 24-24 24zm12.252-34.664l-15.369 17.29-9.259-7.407a1 1 0 0 0-1.249 1.562l10 8a1 1 0 0 0 1.373-.117l16-18a1 1 0 1 0-1.496-1.328z"/></svg>"##;
const ICON_INFO: &str = r##"<svg class="alert-img" xmlns="http://www.w3.org/2000/svg" fill="#fff" viewBox="0 0 64 64"><path d="M38.535 47.606h-4.08V28.447a1 1 0 0 0-1-1h-4.52a1 1 0 1 0 0 2h3.52v18.159h-5.122a1 1 0 1 0 0 2h11.202a1 1 0 1 0 0-2z"/><circle cx="32" cy="18" r="3"/><path d="M32 0C14.327 0 0 14.327 0 32s14.327 32 32 32 32-14.327 32-32S49.673 0 32 0zm0 62C15.458 62 2 48.542 2 32S15.458 2 32 2s30 13.458 30 30-13.458 30-30 30z"/></svg>"##;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogKind {
    Info,
    Success,
    Error,
    Question,
}

impl DialogKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Error => "error",
            Self::Question => "question",
        }
    }

    /// Header class selecting the header colour, e.g. `success-bg`.
    pub fn header_class(self) -> String {
        format!("{}-bg", self.as_str())
    }

    /// Question dialogs share the error glyph.
    pub fn icon(self) -> &'static str {
        match self {
            Self::Success => ICON_SUCCESS,
            Self::Info => ICON_INFO,
            Self::Error | Self::Question => ICON_ERROR,
        }
    }

    pub fn is_question(self) -> bool {
        self == Self::Question
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CloseStyle {
    #[default]
    Default,
    Circle,
}

impl CloseStyle {
    pub fn class(self) -> &'static str {
        match self {
            Self::Default => "alert-close",
            Self::Circle => "alert-close-circle",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DialogRequest {
    pub kind: DialogKind,
    pub title: String,
    /// Body text. May contain markup.
    pub message: String,
    /// Label of the single acknowledgement button.
    pub button_label: String,
    pub confirm_label: String,
    pub cancel_label: String,
    pub close_style: CloseStyle,
}

impl DialogRequest {
    pub fn new(kind: DialogKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            button_label: "OK".into(),
            confirm_label: "OK".into(),
            cancel_label: "Cancel".into(),
            close_style: CloseStyle::Default,
        }
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DialogKind::Info, title, message)
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DialogKind::Success, title, message)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DialogKind::Error, title, message)
    }

    pub fn question(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DialogKind::Question, title, message)
    }

    pub fn with_button_label(mut self, label: impl Into<String>) -> Self {
        self.button_label = label.into();
        self
    }

    pub fn with_confirm_label(mut self, label: impl Into<String>) -> Self {
        self.confirm_label = label.into();
        self
    }

    pub fn with_cancel_label(mut self, label: impl Into<String>) -> Self {
        self.cancel_label = label.into();
        self
    }

    pub fn with_close_style(mut self, style: CloseStyle) -> Self {
        self.close_style = style;
        self
    }

    /// Message with markup stripped, `<br>` turned into newlines and the
    /// common entities decoded. Used by hosts that cannot render HTML.
    pub fn plain_message(&self) -> String {
        let mut out = String::with_capacity(self.message.len());
        let mut rest = self.message.as_str();
        while let Some(start) = rest.find('<') {
            out.push_str(&rest[..start]);
            let Some(end) = rest[start..].find('>') else {
                out.push_str(&rest[start..]);
                rest = "";
                break;
            };
            let tag = rest[start + 1..start + end]
                .trim()
                .trim_end_matches('/')
                .trim()
                .to_ascii_lowercase();
            if tag == "br" {
                out.push('\n');
            }
            rest = &rest[start + end + 1..];
        }
        out.push_str(rest);
        out.replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'")
            .replace("&amp;", "&")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogOutcome {
    Confirmed,
    Dismissed,
}

impl DialogOutcome {
    pub fn is_confirmed(self) -> bool {
        self == Self::Confirmed
    }
}

/// The interaction that closed a dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dismissal {
    /// Single acknowledgement button of non-question dialogs.
    Button,
    Confirm,
    Cancel,
    CloseGlyph,
    Backdrop,
}

#[derive(Default)]
struct Slot {
    outcome: Option<DialogOutcome>,
    waker: Option<Waker>,
}

#[derive(Clone)]
struct Resolver {
    slot: Rc<RefCell<Slot>>,
}

impl Resolver {
    /// Store `outcome` unless one is already present. Returns whether this
    /// call resolved the slot.
    fn resolve(&self, outcome: DialogOutcome) -> bool {
        let waker = {
            let mut slot = self.slot.borrow_mut();
            if slot.outcome.is_some() {
                return false;
            }
            slot.outcome = Some(outcome);
            slot.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
        true
    }

    fn is_resolved(&self) -> bool {
        self.slot.borrow().outcome.is_some()
    }
}

/// Result of an open dialog. Await it, or poll [`PendingDialog::outcome`]
/// from a frame loop.
pub struct PendingDialog {
    slot: Rc<RefCell<Slot>>,
}

impl PendingDialog {
    pub fn outcome(&self) -> Option<DialogOutcome> {
        self.slot.borrow().outcome
    }

    pub fn is_resolved(&self) -> bool {
        self.outcome().is_some()
    }
}

impl std::fmt::Debug for PendingDialog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingDialog")
            .field("outcome", &self.outcome())
            .finish()
    }
}

impl Future for PendingDialog {
    type Output = DialogOutcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<DialogOutcome> {
        let mut slot = self.slot.borrow_mut();
        match slot.outcome {
            Some(outcome) => Poll::Ready(outcome),
            None => {
                slot.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

/// One dialog instance. Resolves at most once; later dismissals are ignored.
pub struct AlertDialog {
    request: DialogRequest,
    resolver: Resolver,
}

impl AlertDialog {
    pub fn new(request: DialogRequest) -> (Self, PendingDialog) {
        let slot = Rc::new(RefCell::new(Slot::default()));
        let dialog = Self {
            request,
            resolver: Resolver { slot: slot.clone() },
        };
        (dialog, PendingDialog { slot })
    }

    pub fn request(&self) -> &DialogRequest {
        &self.request
    }

    pub fn is_resolved(&self) -> bool {
        self.resolver.is_resolved()
    }

    /// Close the dialog. Only `Confirm` on a question dialog yields
    /// [`DialogOutcome::Confirmed`]. Returns `None` when the dialog was
    /// already closed.
    pub fn dismiss(&self, how: Dismissal) -> Option<DialogOutcome> {
        let outcome = if how == Dismissal::Confirm && self.request.kind.is_question() {
            DialogOutcome::Confirmed
        } else {
            DialogOutcome::Dismissed
        };
        if !self.resolver.resolve(outcome) {
            return None;
        }
        tracing::debug!(
            kind = self.request.kind.as_str(),
            title = %self.request.title,
            ?how,
            ?outcome,
            "alert dialog closed"
        );
        Some(outcome)
    }

    /// Insert the dialog markup as the last child of `target` and wire its
    /// dismissal handlers. Returns the wrapper node, which is removed again
    /// when the dialog resolves.
    pub fn mount(self, doc: &mut Document, target: NodeId) -> NodeId {
        let request = &self.request;
        let close_class = request.close_style.class();

        let wrapper = doc.create_element("div");
        doc.add_class(wrapper, WRAPPER_CLASS);
        let frame = doc.create_element("div");
        doc.add_class(frame, FRAME_CLASS);
        doc.append_child(wrapper, frame);

        let header = doc.create_element("div");
        doc.add_class(header, "alert-header");
        doc.add_class(header, &request.kind.header_class());
        doc.append_child(frame, header);
        let close = doc.create_element("span");
        doc.add_class(close, close_class);
        doc.set_text(close, "X");
        doc.append_child(header, close);
        let icon = doc.create_element("span");
        doc.add_class(icon, "alert-icon");
        doc.set_inner_html(icon, request.kind.icon());
        doc.append_child(header, icon);

        let body = doc.create_element("div");
        doc.add_class(body, "alert-body");
        doc.append_child(frame, body);
        let title = doc.create_element("span");
        doc.add_class(title, "alert-title");
        doc.set_text(title, &request.title);
        doc.append_child(body, title);
        let message = doc.create_element("span");
        doc.add_class(message, "alert-message");
        doc.set_inner_html(message, &request.message);
        doc.append_child(body, message);

        let buttons = doc.create_element("div");
        doc.append_child(body, buttons);
        let mut wiring = vec![(close, Dismissal::CloseGlyph), (wrapper, Dismissal::Backdrop)];
        if request.kind.is_question() {
            doc.add_class(buttons, "question-buttons");
            let confirm = doc.create_element("button");
            doc.add_class(confirm, "confirm-button mui-btn mui-btn--danger");
            doc.set_text(confirm, &request.confirm_label);
            doc.append_child(buttons, confirm);
            let cancel = doc.create_element("button");
            doc.add_class(cancel, "cancel-button mui-btn");
            doc.set_text(cancel, &request.cancel_label);
            doc.append_child(buttons, cancel);
            wiring.push((confirm, Dismissal::Confirm));
            wiring.push((cancel, Dismissal::Cancel));
        } else {
            let button = doc.create_element("button");
            doc.add_class(button, "alert-button mui-btn mui-btn--primary");
            doc.set_text(button, &request.button_label);
            doc.append_child(buttons, button);
            wiring.push((button, Dismissal::Button));
        }

        tracing::debug!(
            kind = request.kind.as_str(),
            title = %request.title,
            "alert dialog opened"
        );

        let dialog = Rc::new(self);
        for (node, how) in wiring {
            let dialog = Rc::clone(&dialog);
            doc.on_click(node, move |doc, _| {
                if dialog.dismiss(how).is_some() {
                    doc.remove(wrapper);
                }
            });
        }
        doc.on_click(frame, |_, event| event.stop_propagation());

        doc.append_child(target, wrapper);
        wrapper
    }
}

/// Open `request` inside `target` of `doc`.
pub fn show(doc: &mut Document, target: NodeId, request: DialogRequest) -> PendingDialog {
    let (dialog, pending) = AlertDialog::new(request);
    dialog.mount(doc, target);
    pending
}

/// Something that can present a dialog and hand back its pending result.
pub trait DialogHost {
    fn show(&self, request: DialogRequest) -> PendingDialog;
}

/// Hosts dialogs in a shared [`Document`] below a fixed target node.
#[derive(Clone)]
pub struct DomHost {
    document: Rc<RefCell<Document>>,
    target: NodeId,
}

impl DomHost {
    pub fn new(document: Rc<RefCell<Document>>, target: NodeId) -> Self {
        Self { document, target }
    }

    /// Host mounting into the body of a fresh document.
    pub fn detached() -> Self {
        let doc = Document::new();
        let body = doc.body();
        Self::new(Rc::new(RefCell::new(doc)), body)
    }

    pub fn document(&self) -> &Rc<RefCell<Document>> {
        &self.document
    }

    pub fn target(&self) -> NodeId {
        self.target
    }
}

impl DialogHost for DomHost {
    fn show(&self, request: DialogRequest) -> PendingDialog {
        let mut doc = self.document.borrow_mut();
        show(&mut doc, self.target, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_message_strips_markup() {
        let req = DialogRequest::info(
            "Targets",
            "<b>Current target:</b> AAT.<br/><br />Flashing &amp; more",
        );
        assert_eq!(req.plain_message(), "Current target: AAT.\n\nFlashing & more");
    }

    #[test]
    fn confirm_only_counts_for_questions() {
        let (dialog, pending) = AlertDialog::new(DialogRequest::info("t", "m"));
        assert_eq!(dialog.dismiss(Dismissal::Confirm), Some(DialogOutcome::Dismissed));
        assert_eq!(pending.outcome(), Some(DialogOutcome::Dismissed));
    }

    #[test]
    fn second_dismissal_is_ignored() {
        let (dialog, pending) = AlertDialog::new(DialogRequest::question("t", "m"));
        assert_eq!(dialog.dismiss(Dismissal::Confirm), Some(DialogOutcome::Confirmed));
        assert_eq!(dialog.dismiss(Dismissal::Cancel), None);
        assert_eq!(pending.outcome(), Some(DialogOutcome::Confirmed));
    }
}
