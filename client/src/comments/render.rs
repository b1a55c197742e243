use crate::comments::Comment;

/// How comment content is interpolated into markup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Escaping {
    /// Escape HTML special characters.
    #[default]
    Html,
    /// Insert content verbatim. Only safe for trusted content.
    Raw,
}

/// Render one `<li>` per comment, in order. An empty slice renders to "".
pub fn render_comments(comments: &[Comment], escaping: Escaping) -> String {
    comments
        .iter()
        .map(|comment| {
            let content = match escaping {
                Escaping::Html => escape_html(&comment.content),
                Escaping::Raw => comment.content.clone(),
            };
            format!("<li class=\"collection-item\">{}</li>", content)
        })
        .collect()
}

fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            c => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_in_order() {
        let comments = vec![Comment::new("first"), Comment::new("second")];
        assert_eq!(
            render_comments(&comments, Escaping::Html),
            "<li class=\"collection-item\">first</li><li class=\"collection-item\">second</li>"
        );
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_comments(&[], Escaping::Html), "");
        assert_eq!(render_comments(&[], Escaping::Raw), "");
    }

    #[test]
    fn test_escaping() {
        let comments = vec![Comment::new("<b>\"Tom\" & 'Jerry'</b>")];
        assert_eq!(
            render_comments(&comments, Escaping::Html),
            "<li class=\"collection-item\">&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;</li>"
        );
        assert_eq!(
            render_comments(&comments, Escaping::Raw),
            "<li class=\"collection-item\"><b>\"Tom\" & 'Jerry'</b></li>"
        );
    }
}
