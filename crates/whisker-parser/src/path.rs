//! Path expression parsing: `this`, `a.b`, `a/b`, `../a`, `@index`, `@root.a`.

use whisker_core::{ParseError, ParseErrorKind, Path, PathRoot, Span};

/// Parse a single path expression.
pub fn parse_path(text: &str, span: Span) -> Result<Path, ParseError> {
    let invalid = |detail: &str| {
        ParseError::new(
            ParseErrorKind::InvalidPath,
            span,
            format!("invalid path '{text}': {detail}"),
        )
    };

    let mut rest = text;
    let mut parents = 0;
    while let Some(stripped) = rest.strip_prefix("../") {
        parents += 1;
        rest = stripped;
    }
    if rest == ".." {
        return Ok(Path {
            parents: parents + 1,
            root: PathRoot::Context,
            segments: Vec::new(),
        });
    }

    if rest == "this" || rest == "." {
        return Ok(Path {
            parents,
            root: PathRoot::Context,
            segments: Vec::new(),
        });
    }
    for prefix in ["this.", "this/", "./"] {
        if let Some(stripped) = rest.strip_prefix(prefix) {
            rest = stripped;
            break;
        }
    }

    let root = match rest.strip_prefix('@') {
        Some(data) => {
            let end = data.find(['.', '/']).unwrap_or(data.len());
            let name = &data[..end];
            if name.is_empty() || !name.bytes().all(is_segment_byte) {
                return Err(invalid("data variables are written '@name'"));
            }
            rest = data[end..].get(1..).unwrap_or("");
            if end < data.len() && rest.is_empty() {
                return Err(invalid("empty segment"));
            }
            PathRoot::Data(name.to_string())
        }
        None => {
            if rest.is_empty() {
                return Err(invalid("empty segment"));
            }
            PathRoot::Context
        }
    };

    let mut segments = Vec::new();
    if !rest.is_empty() {
        for segment in rest.split(['.', '/']) {
            if segment.is_empty() {
                return Err(invalid("empty segment"));
            }
            if segment == ".." {
                return Err(invalid("'../' is only allowed at the start"));
            }
            if !segment.bytes().all(is_segment_byte) {
                return Err(invalid("unexpected character"));
            }
            segments.push(segment.to_string());
        }
    }

    Ok(Path {
        parents,
        root,
        segments,
    })
}

#[inline]
fn is_segment_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'$') || b >= 0x80
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Path, ParseError> {
        parse_path(text, Span::new(1, 1, text.len() as u32))
    }

    #[test]
    fn this_forms() {
        assert!(parse("this").unwrap().is_this());
        assert!(parse(".").unwrap().is_this());
    }

    #[test]
    fn dotted_and_slashed_segments() {
        assert_eq!(parse("user.name").unwrap(), Path::from_segments(["user", "name"]));
        assert_eq!(parse("user/name").unwrap(), Path::from_segments(["user", "name"]));
        assert_eq!(parse("this.name").unwrap(), Path::from_segments(["name"]));
        assert_eq!(parse("items.0").unwrap(), Path::from_segments(["items", "0"]));
    }

    #[test]
    fn parent_hops() {
        let path = parse("../../title").unwrap();
        assert_eq!(path.parents, 2);
        assert_eq!(path.segments, ["title"]);

        let parent = parse("../this").unwrap();
        assert_eq!(parent.parents, 1);
        assert!(parent.segments.is_empty());
    }

    #[test]
    fn data_variables() {
        let index = parse("@index").unwrap();
        assert_eq!(index.root, PathRoot::Data("index".into()));
        assert!(index.segments.is_empty());

        let root = parse("@root.site.title").unwrap();
        assert_eq!(root.root, PathRoot::Data("root".into()));
        assert_eq!(root.segments, ["site", "title"]);
    }

    #[test]
    fn invalid_paths() {
        for text in ["a..b", "a.", "@", "@root.", "a/../b", "a(b)", "\"str\""] {
            let error = parse(text).unwrap_err();
            assert_eq!(error.kind, ParseErrorKind::InvalidPath, "{text}");
        }
    }
}
