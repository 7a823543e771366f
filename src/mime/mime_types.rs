//! Static extension to MIME type table for attachments.
//!
//! The mapping keeps its historical quirks (`image/jpg`, `audio/mpeg3`) so
//! rendered messages stay byte-compatible.

/// Looks up the MIME type for a lowercased file extension. Unknown extensions
/// map to `unknown/<ext>`.
pub fn mime_type_for_extension(ext: &str) -> String {
    match ext {
        "js" => "application/x-javascript".to_string(),
        "jpg" | "jpeg" | "jpe" => "image/jpg".to_string(),
        "png" | "gif" | "bmp" | "tiff" => format!("image/{}", ext),
        "css" => "text/css".to_string(),
        "doc" | "docx" => "application/msword".to_string(),
        "xls" | "xlsx" | "xlt" | "xlm" | "xld" | "xla" | "xlc" | "xlw" | "xll" => {
            "application/vnd.ms-excel".to_string()
        }
        "ppt" | "pptx" | "pps" => "application/vnd.ms-powerpoint".to_string(),
        "html" | "htm" | "php" => "text/html".to_string(),
        "txt" => "text/plain".to_string(),
        "mpeg" | "mpg" | "mpe" => "video/mpeg".to_string(),
        "mp3" => "audio/mpeg3".to_string(),
        "mp4" => "video/mp4".to_string(),
        "wav" => "audio/wav".to_string(),
        "aiff" | "aif" => "audio/aiff".to_string(),
        "avi" => "video/msvideo".to_string(),
        "wmv" => "video/x-ms-wmv".to_string(),
        "mov" => "video/quicktime".to_string(),
        "zip" | "gz" | "rar" | "rtf" | "pdf" | "json" | "xml" => format!("application/{}", ext),
        "tar" => "application/x-tar".to_string(),
        "swf" => "application/x-shockwave-flash".to_string(),
        _ => format!("unknown/{}", ext),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_known_extensions() {
        assert_eq!(mime_type_for_extension("pdf"), "application/pdf");
        assert_eq!(mime_type_for_extension("jpeg"), "image/jpg");
        assert_eq!(mime_type_for_extension("png"), "image/png");
        assert_eq!(mime_type_for_extension("docx"), "application/msword");
        assert_eq!(mime_type_for_extension("mp3"), "audio/mpeg3");
        assert_eq!(mime_type_for_extension("tar"), "application/x-tar");
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(mime_type_for_extension("xyz"), "unknown/xyz");
        assert_eq!(mime_type_for_extension(""), "unknown/");
    }
}
