//! Typed language feature requests.
//!
//! Thin wrappers over [`Session::request`] that build the params from a
//! document URI and position. Anything not covered here can still be sent
//! with [`Session::request`] and a marker from [`crate::types::methods`], or
//! as raw JSON with [`Session::send_request`].

use crate::error::Result;
use crate::session::Session;
use crate::types::methods;
use crate::types::*;
use tokio::io::AsyncWrite;

fn position_params(uri: &str, position: Position) -> TextDocumentPositionParams {
    TextDocumentPositionParams::new(uri, position)
}

fn goto_params(uri: &str, position: Position) -> GotoParams {
    GotoParams {
        text_document_position: position_params(uri, position),
        work_done_progress_params: WorkDoneProgressParams::default(),
        partial_result_params: PartialResultParams::default(),
    }
}

impl<W> Session<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    /// `textDocument/completion`. A `null` answer yields an empty list.
    pub async fn completion(&self, uri: &str, position: Position) -> Result<Vec<CompletionItem>> {
        let params = CompletionParams {
            text_document_position: position_params(uri, position),
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
            context: None,
        };
        let response = self.request::<methods::Completion>(params).await?;
        Ok(match response {
            Some(CompletionResponse::Array(items)) => items,
            Some(CompletionResponse::List(list)) => list.items,
            None => Vec::new(),
        })
    }

    pub async fn signature_help(&self, uri: &str, position: Position) -> Result<Option<SignatureHelp>> {
        let params = SignatureHelpParams {
            text_document_position: position_params(uri, position),
            work_done_progress_params: WorkDoneProgressParams::default(),
            context: None,
        };
        self.request::<methods::SignatureHelpRequest>(params).await
    }

    pub async fn hover(&self, uri: &str, position: Position) -> Result<Option<Hover>> {
        let params = HoverParams {
            text_document_position: position_params(uri, position),
            work_done_progress_params: WorkDoneProgressParams::default(),
        };
        self.request::<methods::HoverRequest>(params).await
    }

    /// `textDocument/definition`, flattened to locations.
    pub async fn definition(&self, uri: &str, position: Position) -> Result<Vec<Location>> {
        let response = self
            .request::<methods::GotoDefinition>(goto_params(uri, position))
            .await?;
        Ok(response.map(GotoResponse::into_locations).unwrap_or_default())
    }

    /// `textDocument/declaration`, flattened to locations.
    pub async fn declaration(&self, uri: &str, position: Position) -> Result<Vec<Location>> {
        let response = self
            .request::<methods::GotoDeclaration>(goto_params(uri, position))
            .await?;
        Ok(response.map(GotoResponse::into_locations).unwrap_or_default())
    }

    pub async fn references(
        &self,
        uri: &str,
        position: Position,
        include_declaration: bool,
    ) -> Result<Vec<Location>> {
        let params = ReferenceParams {
            text_document_position: position_params(uri, position),
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
            context: ReferenceContext {
                include_declaration,
            },
        };
        Ok(self
            .request::<methods::References>(params)
            .await?
            .unwrap_or_default())
    }

    pub async fn document_symbols(&self, uri: &str) -> Result<Option<DocumentSymbolResponse>> {
        let params = DocumentSymbolParams {
            text_document: TextDocumentIdentifier::new(uri),
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
        };
        self.request::<methods::DocumentSymbolRequest>(params).await
    }

    /// `textDocument/formatting`. The edits are not applied.
    pub async fn formatting(&self, uri: &str, options: FormattingOptions) -> Result<Vec<TextEdit>> {
        let params = DocumentFormattingParams {
            text_document: TextDocumentIdentifier::new(uri),
            options,
            work_done_progress_params: WorkDoneProgressParams::default(),
        };
        Ok(self
            .request::<methods::Formatting>(params)
            .await?
            .unwrap_or_default())
    }

    pub async fn rename(
        &self,
        uri: &str,
        position: Position,
        new_name: impl Into<String>,
    ) -> Result<Option<WorkspaceEdit>> {
        let params = RenameParams {
            text_document_position: position_params(uri, position),
            new_name: new_name.into(),
            work_done_progress_params: WorkDoneProgressParams::default(),
        };
        self.request::<methods::Rename>(params).await
    }

    pub async fn color_presentation(
        &self,
        uri: &str,
        color: Color,
        range: Range,
    ) -> Result<Vec<ColorPresentation>> {
        let params = ColorPresentationParams {
            text_document: TextDocumentIdentifier::new(uri),
            color,
            range,
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
        };
        self.request::<methods::ColorPresentationRequest>(params)
            .await
    }

    pub async fn document_color(&self, uri: &str) -> Result<Vec<ColorInformation>> {
        let params = DocumentColorParams {
            text_document: TextDocumentIdentifier::new(uri),
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
        };
        self.request::<methods::DocumentColor>(params).await
    }

    pub async fn semantic_tokens_full(&self, uri: &str) -> Result<Option<SemanticTokens>> {
        let params = SemanticTokensParams {
            text_document: TextDocumentIdentifier::new(uri),
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
        };
        self.request::<methods::SemanticTokensFull>(params).await
    }

    /// Pull diagnostics for one document.
    pub async fn document_diagnostic(
        &self,
        uri: &str,
        previous_result_id: Option<String>,
    ) -> Result<DocumentDiagnosticReport> {
        let params = DocumentDiagnosticParams {
            text_document: TextDocumentIdentifier::new(uri),
            identifier: None,
            previous_result_id,
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
        };
        self.request::<methods::DocumentDiagnostic>(params).await
    }
}
