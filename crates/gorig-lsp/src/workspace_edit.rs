//! Applying `workspace/applyEdit` requests to files on disk
//!
//! `gopls.tidy` and `gopls.add_import` answer by asking the client to apply
//! an edit to `go.mod` or the importing file. There is no editor buffer in
//! between, so the edit goes straight to disk.

use lsp_types::{
    ApplyWorkspaceEditParams, DocumentChangeOperation, DocumentChanges, OneOf, Position,
    ResourceOp, TextEdit, Uri,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Apply the edit carried by an `applyEdit` request
pub async fn apply(params: ApplyWorkspaceEditParams) -> Result<(), String> {
    let edit = params.edit;

    if let Some(document_changes) = edit.document_changes {
        match document_changes {
            DocumentChanges::Edits(edits) => {
                for edit in edits {
                    let path = uri_to_path(&edit.text_document.uri)?;
                    apply_text_edits(&path, plain_edits(edit.edits)).await?;
                }
            }
            DocumentChanges::Operations(operations) => {
                for operation in operations {
                    apply_operation(operation).await?;
                }
            }
        }
        return Ok(());
    }

    if let Some(changes) = edit.changes {
        for (uri, edits) in changes {
            let path = uri_to_path(&uri)?;
            apply_text_edits(&path, edits).await?;
        }
        return Ok(());
    }

    debug!("workspace edit carried no changes");
    Ok(())
}

fn plain_edits(edits: Vec<OneOf<TextEdit, lsp_types::AnnotatedTextEdit>>) -> Vec<TextEdit> {
    edits
        .into_iter()
        .map(|edit| match edit {
            OneOf::Left(edit) => edit,
            OneOf::Right(annotated) => annotated.text_edit,
        })
        .collect()
}

async fn apply_operation(operation: DocumentChangeOperation) -> Result<(), String> {
    match operation {
        DocumentChangeOperation::Edit(edit) => {
            let path = uri_to_path(&edit.text_document.uri)?;
            apply_text_edits(&path, plain_edits(edit.edits)).await
        }
        DocumentChangeOperation::Op(ResourceOp::Create(create)) => {
            let path = uri_to_path(&create.uri)?;
            info!(path = %path.display(), "Creating file via workspace/applyEdit");
            create_parent(&path).await?;
            tokio::fs::write(&path, "")
                .await
                .map_err(|e| format!("Failed to create file {}: {}", path.display(), e))
        }
        DocumentChangeOperation::Op(ResourceOp::Rename(rename)) => {
            let from = uri_to_path(&rename.old_uri)?;
            let to = uri_to_path(&rename.new_uri)?;
            info!(from = %from.display(), to = %to.display(), "Renaming file via workspace/applyEdit");
            create_parent(&to).await?;
            tokio::fs::rename(&from, &to).await.map_err(|e| {
                format!(
                    "Failed to rename {} to {}: {}",
                    from.display(),
                    to.display(),
                    e
                )
            })
        }
        DocumentChangeOperation::Op(ResourceOp::Delete(delete)) => {
            let path = uri_to_path(&delete.uri)?;
            info!(path = %path.display(), "Deleting file via workspace/applyEdit");
            tokio::fs::remove_file(&path)
                .await
                .map_err(|e| format!("Failed to delete file {}: {}", path.display(), e))
        }
    }
}

async fn create_parent(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            format!(
                "Failed to create parent directories for {}: {}",
                path.display(),
                e
            )
        })?;
    }
    Ok(())
}

/// Apply non-overlapping `edits` to the file at `path`
async fn apply_text_edits(path: &Path, edits: Vec<TextEdit>) -> Result<(), String> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            create_parent(path).await?;
            String::new()
        }
        Err(e) => return Err(format!("Failed to read file {}: {}", path.display(), e)),
    };

    let result = apply_to_text(&content, edits)
        .map_err(|e| format!("Rejected edit for {}: {}", path.display(), e))?;

    info!(path = %path.display(), "Writing workspace edit to file");
    tokio::fs::write(path, result)
        .await
        .map_err(|e| format!("Failed to write file {}: {}", path.display(), e))
}

/// Apply edits to a string; edits at the same position keep their order
///
/// Reversed or overlapping ranges reject the whole set.
pub fn apply_to_text(content: &str, edits: Vec<TextEdit>) -> Result<String, String> {
    let mut resolved: Vec<(usize, usize, usize, String)> = edits
        .into_iter()
        .enumerate()
        .map(|(index, edit)| {
            let start = position_to_offset(content, edit.range.start);
            let end = position_to_offset(content, edit.range.end);
            (start, end, index, edit.new_text)
        })
        .collect();

    resolved.sort_by(|a, b| a.0.cmp(&b.0).then(a.2.cmp(&b.2)));
    let mut previous_end = 0;
    for (start, end, index, _) in &resolved {
        if start > end {
            warn!(index, start, end, "Edit range ends before it starts");
            return Err(format!("edit {} has a reversed range", index));
        }
        if *start < previous_end {
            warn!(index, start, previous_end, "Edit overlaps an earlier edit");
            return Err(format!("edit {} overlaps another edit", index));
        }
        previous_end = *end;
    }

    // Later positions first so earlier offsets stay valid
    let mut result = content.to_string();
    for (start, end, _, new_text) in resolved.into_iter().rev() {
        result.replace_range(start..end, &new_text);
    }
    Ok(result)
}

/// Byte offset of an LSP position (UTF-16 character units)
fn position_to_offset(content: &str, position: Position) -> usize {
    let mut offset = 0;
    for (index, line) in content.split_inclusive('\n').enumerate() {
        if index == position.line as usize {
            let mut units = 0u32;
            for (byte, ch) in line.char_indices() {
                if units >= position.character || ch == '\n' || ch == '\r' {
                    return offset + byte;
                }
                units += ch.len_utf16() as u32;
            }
            return offset + line.len();
        }
        offset += line.len();
    }
    content.len()
}

fn uri_to_path(uri: &Uri) -> Result<PathBuf, String> {
    url::Url::parse(uri.as_str())
        .ok()
        .and_then(|url| url.to_file_path().ok())
        .ok_or_else(|| format!("Unsupported URI: {}", uri.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsp_types::Range;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn edit(start: (u32, u32), end: (u32, u32), text: &str) -> TextEdit {
        TextEdit {
            range: Range {
                start: Position::new(start.0, start.1),
                end: Position::new(end.0, end.1),
            },
            new_text: text.to_string(),
        }
    }

    #[test]
    fn inserts_import_block_line() {
        let source = "package main\n\nimport (\n\t\"fmt\"\n)\n";
        let result = apply_to_text(source, vec![edit((3, 6), (3, 6), "\n\t\"os\"")]).unwrap();
        assert_eq!(result, "package main\n\nimport (\n\t\"fmt\"\n\t\"os\"\n)\n");
    }

    #[test]
    fn multiple_edits_apply_against_unmodified_positions() {
        let source = "a\nb\nc\n";
        let result = apply_to_text(
            source,
            vec![edit((0, 0), (0, 1), "A"), edit((2, 0), (2, 1), "C")],
        )
        .unwrap();
        assert_eq!(result, "A\nb\nC\n");
    }

    #[test]
    fn inserts_at_same_position_keep_order() {
        let result =
            apply_to_text("x", vec![edit((0, 0), (0, 0), "1"), edit((0, 0), (0, 0), "2")]).unwrap();
        assert_eq!(result, "12x");
    }

    #[test]
    fn positions_count_utf16_units() {
        // 'é' is one UTF-16 unit but two bytes
        let result = apply_to_text("é=1\n", vec![edit((0, 1), (0, 2), ":=")]).unwrap();
        assert_eq!(result, "é:=1\n");
    }

    #[test]
    fn position_past_line_end_clamps_before_newline() {
        let result = apply_to_text("ab\ncd\n", vec![edit((0, 10), (0, 10), "!")]).unwrap();
        assert_eq!(result, "ab!\ncd\n");
    }

    #[test]
    fn reversed_or_overlapping_ranges_are_rejected() {
        assert!(apply_to_text("abc\n", vec![edit((0, 2), (0, 1), "x")]).is_err());
        assert!(apply_to_text(
            "abcdef\n",
            vec![edit((0, 0), (0, 3), "x"), edit((0, 2), (0, 4), "y")]
        )
        .is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn rejected_edit_leaves_the_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("main.go");
        std::fs::write(&file, "package main\n").unwrap();
        let uri = url::Url::from_file_path(&file).unwrap().to_string();

        let params: ApplyWorkspaceEditParams = serde_json::from_value(json!({
            "edit": {
                "changes": {
                    uri: [{
                        "range": {"start": {"line": 0, "character": 8}, "end": {"line": 0, "character": 2}},
                        "newText": "x"
                    }]
                }
            }
        }))
        .unwrap();

        assert!(apply(params).await.is_err());
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "package main\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn applies_changes_map_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let go_mod = dir.path().join("go.mod");
        std::fs::write(&go_mod, "module example.com/a\n\ngo 1.22\n").unwrap();
        let uri = url::Url::from_file_path(&go_mod).unwrap().to_string();

        let params: ApplyWorkspaceEditParams = serde_json::from_value(json!({
            "edit": {
                "changes": {
                    uri: [{
                        "range": {"start": {"line": 3, "character": 0}, "end": {"line": 3, "character": 0}},
                        "newText": "\nrequire golang.org/x/text v0.14.0\n"
                    }]
                }
            }
        }))
        .unwrap();

        apply(params).await.unwrap();
        assert_eq!(
            std::fs::read_to_string(&go_mod).unwrap(),
            "module example.com/a\n\ngo 1.22\n\nrequire golang.org/x/text v0.14.0\n"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn applies_document_change_operations() {
        let dir = tempfile::tempdir().unwrap();
        let created = dir.path().join("sub").join("new.go");
        let uri = url::Url::from_file_path(&created).unwrap().to_string();

        let params: ApplyWorkspaceEditParams = serde_json::from_value(json!({
            "edit": {
                "documentChanges": [
                    {"kind": "create", "uri": uri},
                    {
                        "textDocument": {"uri": uri, "version": null},
                        "edits": [{
                            "range": {"start": {"line": 0, "character": 0}, "end": {"line": 0, "character": 0}},
                            "newText": "package sub\n"
                        }]
                    }
                ]
            }
        }))
        .unwrap();

        apply(params).await.unwrap();
        assert_eq!(std::fs::read_to_string(&created).unwrap(), "package sub\n");
    }
}
