// respond/src/mime.rs — file name to Content-Type lookup
use crate::raw::OCTET_STREAM;
use mime_guess::mime;

/// Content type for a file name, judged by the text after its last `.`.
///
/// `"foo/bar/baz.jpg"` gives `"image/jpeg"`. Names without an extension, or
/// with one the table doesn't know, give `application/octet-stream`. Textual
/// types are declared as UTF-8.
pub fn content_type_for(file_name: &str) -> String {
    let Some((_, ext)) = file_name.rsplit_once('.') else {
        return OCTET_STREAM.to_string();
    };

    let Some(guess) = mime_guess::from_ext(ext).first() else {
        return OCTET_STREAM.to_string();
    };

    if guess.type_() == mime::TEXT && guess.get_param(mime::CHARSET).is_none() {
        return format!("{}; charset=utf-8", guess.essence_str());
    }
    guess.to_string()
}
