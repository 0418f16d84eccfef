use crate::pipeline::input::Submission;
use axum::extract::Multipart;

/// Parse the digest form into a [`Submission`].
///
/// Fields: `code` (text), `document` (file, optional), `text` (optional).
/// A file input left empty arrives as a zero-byte part and is treated as
/// absent by [`Submission::into_parts`].
pub async fn parse_multipart(mut multipart: Multipart) -> Result<Submission, String> {
    let mut submission = Submission::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Failed to read form field: {}", e))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "code" => {
                submission.code = field
                    .text()
                    .await
                    .map_err(|e| format!("Failed to read code: {}", e))?;
            }
            "document" => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| format!("Failed to read file data: {}", e))?;
                if !data.is_empty() {
                    submission.document = Some(data.to_vec());
                }
            }
            "text" => {
                let val = field
                    .text()
                    .await
                    .map_err(|e| format!("Failed to read text: {}", e))?;
                if !val.is_empty() {
                    submission.text = Some(val);
                }
            }
            _ => {
                // Ignore unknown fields
                let _ = field.bytes().await;
            }
        }
    }

    Ok(submission)
}
