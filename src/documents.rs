//! Client-side view of the documents synchronized with the server.
//!
//! The store owns document versions. Every operation validates against the
//! current state, updates it, and hands back the params of the notification
//! that tells the server about the change.

use crate::error::{LspError, Result};
use crate::types::{
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    DidSaveTextDocumentParams, DocumentUri, TextDocumentContentChangeEvent,
    TextDocumentIdentifier, TextDocumentItem, VersionedTextDocumentIdentifier,
};
use std::collections::HashMap;

/// The version a document gets when it is first opened without one.
pub const INITIAL_VERSION: i32 = 1;

/// What the client knows about one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentState {
    pub uri: DocumentUri,
    pub language_id: String,
    /// The last version sent to the server. Kept after close.
    pub version: i32,
    pub is_open: bool,
}

#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: HashMap<DocumentUri, DocumentState>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a document.
    ///
    /// Without an explicit version a new document starts at
    /// [`INITIAL_VERSION`] and a reopened one continues after its last
    /// version. An explicit version must move past the last one.
    pub fn open(
        &mut self,
        uri: impl Into<DocumentUri>,
        language_id: impl Into<String>,
        version: Option<i32>,
        text: impl Into<String>,
    ) -> Result<DidOpenTextDocumentParams> {
        let uri = uri.into();
        let language_id = language_id.into();

        let version = match self.documents.get(&uri) {
            Some(document) if document.is_open => return Err(LspError::AlreadyOpen(uri)),
            Some(document) => match version {
                Some(version) if version <= document.version => {
                    return Err(LspError::StaleVersion {
                        current: document.version,
                        uri,
                        version,
                    })
                }
                Some(version) => version,
                None => next_version(&uri, document.version)?,
            },
            None => version.unwrap_or(INITIAL_VERSION),
        };

        log::debug!("Opening {} ({}) at version {}", uri, language_id, version);
        self.documents.insert(
            uri.clone(),
            DocumentState {
                uri: uri.clone(),
                language_id: language_id.clone(),
                version,
                is_open: true,
            },
        );

        Ok(DidOpenTextDocumentParams {
            text_document: TextDocumentItem {
                uri,
                language_id,
                version,
                text: text.into(),
            },
        })
    }

    /// Apply content changes, bumping the version by one.
    pub fn change(
        &mut self,
        uri: &str,
        content_changes: Vec<TextDocumentContentChangeEvent>,
    ) -> Result<DidChangeTextDocumentParams> {
        let document = self.open_document_mut(uri)?;
        document.version = next_version(uri, document.version)?;
        log::trace!("Changed {} to version {}", uri, document.version);

        Ok(DidChangeTextDocumentParams {
            text_document: VersionedTextDocumentIdentifier::new(uri, document.version),
            content_changes,
        })
    }

    /// Record a save. The version does not change.
    pub fn save(&mut self, uri: &str, text: Option<String>) -> Result<DidSaveTextDocumentParams> {
        self.open_document_mut(uri)?;
        Ok(DidSaveTextDocumentParams {
            text_document: TextDocumentIdentifier::new(uri),
            text,
        })
    }

    /// Close a document. Its last version is remembered for a later reopen.
    pub fn close(&mut self, uri: &str) -> Result<DidCloseTextDocumentParams> {
        let document = self.open_document_mut(uri)?;
        document.is_open = false;
        log::debug!("Closed {} at version {}", uri, document.version);

        Ok(DidCloseTextDocumentParams {
            text_document: TextDocumentIdentifier::new(uri),
        })
    }

    pub fn get(&self, uri: &str) -> Option<&DocumentState> {
        self.documents.get(uri)
    }

    /// The current version of an open document.
    pub fn version(&self, uri: &str) -> Option<i32> {
        self.documents
            .get(uri)
            .filter(|document| document.is_open)
            .map(|document| document.version)
    }

    pub fn is_open(&self, uri: &str) -> bool {
        self.version(uri).is_some()
    }

    pub fn open_documents(&self) -> impl Iterator<Item = &DocumentState> {
        self.documents.values().filter(|document| document.is_open)
    }

    fn open_document_mut(&mut self, uri: &str) -> Result<&mut DocumentState> {
        match self.documents.get_mut(uri) {
            Some(document) if document.is_open => Ok(document),
            _ => Err(LspError::NotOpen(uri.to_string())),
        }
    }
}

fn next_version(uri: &str, current: i32) -> Result<i32> {
    current.checked_add(1).ok_or_else(|| LspError::StaleVersion {
        uri: uri.to_string(),
        version: current,
        current,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const URI: &str = "file:///w/main.lua";

    #[test]
    fn test_open_change_close_versions() {
        let mut store = DocumentStore::new();

        let opened = store.open(URI, "lua", None, "local x").unwrap();
        assert_eq!(opened.text_document.version, 1);
        assert_eq!(opened.text_document.language_id, "lua");

        let changed = store
            .change(URI, vec![TextDocumentContentChangeEvent::full("local y")])
            .unwrap();
        assert_eq!(changed.text_document.version, 2);
        assert_eq!(store.version(URI), Some(2));

        let saved = store.save(URI, None).unwrap();
        assert_eq!(saved.text_document.uri, URI);
        assert_eq!(store.version(URI), Some(2));

        store.close(URI).unwrap();
        assert!(!store.is_open(URI));
        assert_eq!(store.get(URI).map(|d| d.version), Some(2));
    }

    #[test]
    fn test_double_open_rejected() {
        let mut store = DocumentStore::new();
        store.open(URI, "lua", Some(2), "").unwrap();
        assert!(matches!(
            store.open(URI, "lua", None, ""),
            Err(LspError::AlreadyOpen(ref uri)) if uri == URI
        ));
    }

    #[test]
    fn test_operations_on_closed_document() {
        let mut store = DocumentStore::new();
        assert!(matches!(store.change(URI, vec![]), Err(LspError::NotOpen(_))));
        assert!(matches!(store.close(URI), Err(LspError::NotOpen(_))));

        store.open(URI, "lua", None, "").unwrap();
        store.close(URI).unwrap();
        assert!(matches!(store.close(URI), Err(LspError::NotOpen(_))));
        assert!(matches!(store.save(URI, None), Err(LspError::NotOpen(_))));
    }

    #[test]
    fn test_reopen_continues_versions() {
        let mut store = DocumentStore::new();
        store.open(URI, "lua", Some(2), "").unwrap();
        store.change(URI, vec![]).unwrap();
        store.close(URI).unwrap();

        let reopened = store.open(URI, "lua", None, "").unwrap();
        assert_eq!(reopened.text_document.version, 4);
        store.close(URI).unwrap();

        assert!(matches!(
            store.open(URI, "lua", Some(4), ""),
            Err(LspError::StaleVersion { version: 4, current: 4, .. })
        ));
        assert_eq!(
            store.open(URI, "lua", Some(10), "").unwrap().text_document.version,
            10
        );
    }

    #[test]
    fn test_open_documents_lists_only_open() {
        let mut store = DocumentStore::new();
        store.open("file:///a.lua", "lua", None, "").unwrap();
        store.open("file:///b.lua", "lua", None, "").unwrap();
        store.close("file:///a.lua").unwrap();

        let open: Vec<_> = store.open_documents().map(|d| d.uri.as_str()).collect();
        assert_eq!(open, vec!["file:///b.lua"]);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Open(usize, Option<i32>),
        Change(usize),
        Save(usize),
        Close(usize),
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..3usize, prop::option::of(1..50i32)).prop_map(|(d, v)| Op::Open(d, v)),
            (0..3usize).prop_map(Op::Change),
            (0..3usize).prop_map(Op::Save),
            (0..3usize).prop_map(Op::Close),
        ]
    }

    proptest! {
        #[test]
        fn prop_versions_strictly_increase(ops in prop::collection::vec(arb_op(), 1..64)) {
            let uris = ["file:///a.lua", "file:///b.lua", "file:///c.lua"];
            let mut store = DocumentStore::new();
            let mut last_sent: HashMap<&str, i32> = HashMap::new();

            for op in ops {
                let sent = match op {
                    Op::Open(d, version) => store
                        .open(uris[d], "lua", version, "")
                        .ok()
                        .map(|p| (d, p.text_document.version)),
                    Op::Change(d) => store
                        .change(uris[d], vec![])
                        .ok()
                        .map(|p| (d, p.text_document.version)),
                    Op::Save(d) => {
                        let was_open = store.is_open(uris[d]);
                        prop_assert_eq!(store.save(uris[d], None).is_ok(), was_open);
                        None
                    }
                    Op::Close(d) => {
                        let was_open = store.is_open(uris[d]);
                        prop_assert_eq!(store.close(uris[d]).is_ok(), was_open);
                        None
                    }
                };

                if let Some((d, version)) = sent {
                    if let Some(previous) = last_sent.insert(uris[d], version) {
                        prop_assert!(version > previous);
                    }
                }
            }
        }
    }
}
