//! `Record` — the message being filtered.
//!
//! The engine never constructs or stores records. It reads a handful of
//! header-like fields and mutates the label set, nothing else. Hosts implement
//! [`Record`] for their own message type.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;

/// Label names the built-in conditions and actions operate on.
pub mod labels {
    /// Messages shown in the inbox.
    pub const INBOX: &str = "inbox";
    /// Messages not yet read.
    pub const UNREAD: &str = "unread";
    /// Starred messages.
    pub const STARRED: &str = "starred";
    /// Messages classified as spam.
    pub const SPAM: &str = "spam";
    /// Messages marked for deletion.
    pub const DELETED: &str = "deleted";
}

/// A message that filters can inspect and relabel.
///
/// Text accessors return [`Cow`] so implementations can hand out borrowed
/// header values or format addresses on the fly.
///
/// # Example
///
/// ```
/// use mailsift::Record;
/// use std::borrow::Cow;
/// use std::collections::BTreeSet;
///
/// struct Mail { from: String, labels: BTreeSet<String> }
///
/// impl Record for Mail {
///     fn from(&self) -> Cow<'_, str> { Cow::Borrowed(&self.from) }
///     fn to(&self) -> Cow<'_, str> { Cow::Borrowed("") }
///     fn subject(&self) -> Cow<'_, str> { Cow::Borrowed("") }
///     fn list_address(&self) -> Cow<'_, str> { Cow::Borrowed("") }
///     fn raw_text(&self) -> Cow<'_, str> { Cow::Borrowed("") }
///     fn has_label(&self, name: &str) -> bool { self.labels.contains(name) }
///     fn add_label(&mut self, name: &str) { self.labels.insert(name.to_owned()); }
///     fn remove_label(&mut self, name: &str) { self.labels.remove(name); }
///     fn replace_labels(&mut self, labels: BTreeSet<String>) { self.labels = labels; }
/// }
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `Record`",
    label = "filters cannot read or relabel this type",
    note = "implement the field accessors and label operations of `mailsift::Record` for your message type"
)]
pub trait Record {
    /// Sender address as text.
    fn from(&self) -> Cow<'_, str>;

    /// Recipient address(es) as text.
    fn to(&self) -> Cow<'_, str>;

    /// Subject line.
    fn subject(&self) -> Cow<'_, str>;

    /// Mailing-list address, empty when the message is not from a list.
    fn list_address(&self) -> Cow<'_, str>;

    /// The full raw message text, headers included.
    fn raw_text(&self) -> Cow<'_, str>;

    /// Whether the label is present.
    fn has_label(&self, name: &str) -> bool;

    /// Add a label. Adding a present label is a no-op.
    fn add_label(&mut self, name: &str);

    /// Remove a label. Removing an absent label is a no-op.
    fn remove_label(&mut self, name: &str);

    /// Replace the whole label set.
    fn replace_labels(&mut self, labels: BTreeSet<String>);
}

/// Which text field of a [`Record`] a text condition reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordField {
    /// [`Record::raw_text`].
    RawText,
    /// [`Record::from`].
    From,
    /// [`Record::to`].
    To,
    /// [`Record::subject`].
    Subject,
    /// [`Record::list_address`].
    ListAddress,
}

impl RecordField {
    /// Read this field from a record.
    pub fn get<'r, R: Record + ?Sized>(self, record: &'r R) -> Cow<'r, str> {
        match self {
            Self::RawText => record.raw_text(),
            Self::From => record.from(),
            Self::To => record.to(),
            Self::Subject => record.subject(),
            Self::ListAddress => record.list_address(),
        }
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::RawText => "raw_text",
            Self::From => "from",
            Self::To => "to",
            Self::Subject => "subject",
            Self::ListAddress => "list_address",
        })
    }
}
