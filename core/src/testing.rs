//! In-crate test record.

use crate::Record;
use std::borrow::Cow;
use std::collections::BTreeSet;

/// Route `tracing` output through the test harness. Safe to call repeatedly.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("mailsift=debug")
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Msg {
    from: String,
    to: String,
    subject: String,
    list: String,
    body: String,
    labels: BTreeSet<String>,
}

impl Msg {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_from(mut self, from: &str) -> Self {
        self.from = from.to_owned();
        self
    }

    pub(crate) fn with_to(mut self, to: &str) -> Self {
        self.to = to.to_owned();
        self
    }

    pub(crate) fn with_subject(mut self, subject: &str) -> Self {
        self.subject = subject.to_owned();
        self
    }

    pub(crate) fn with_list(mut self, list: &str) -> Self {
        self.list = list.to_owned();
        self
    }

    pub(crate) fn with_body(mut self, body: &str) -> Self {
        self.body = body.to_owned();
        self
    }

    pub(crate) fn with_labels(mut self, labels: &[&str]) -> Self {
        self.labels = labels.iter().map(|l| (*l).to_owned()).collect();
        self
    }

    pub(crate) fn label_list(&self) -> Vec<&str> {
        self.labels.iter().map(String::as_str).collect()
    }
}

impl Record for Msg {
    fn from(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.from)
    }

    fn to(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.to)
    }

    fn subject(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.subject)
    }

    fn list_address(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.list)
    }

    fn raw_text(&self) -> Cow<'_, str> {
        Cow::Owned(format!(
            "From: {}\nTo: {}\nSubject: {}\n\n{}",
            self.from, self.to, self.subject, self.body
        ))
    }

    fn has_label(&self, name: &str) -> bool {
        self.labels.contains(name)
    }

    fn add_label(&mut self, name: &str) {
        self.labels.insert(name.to_owned());
    }

    fn remove_label(&mut self, name: &str) {
        self.labels.remove(name);
    }

    fn replace_labels(&mut self, labels: BTreeSet<String>) {
        self.labels = labels;
    }
}
