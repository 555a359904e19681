use crate::models::RandomImage;
use crate::views::html::escape;

/// Public page; an empty container when there is nothing to show
pub fn render_gallery(image: Option<&RandomImage>) -> String {
    let (html_style, body) = match image {
        Some(image) => (
            format!(" style=\"color-scheme: {}\"", image.color_scheme.as_str()),
            format!(
                "<img src=\"{}\" alt=\"{}\">",
                escape(&image.url),
                escape(&image.filename)
            ),
        ),
        None => (String::new(), String::new()),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en"{html_style}>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>framewall</title>
<style>
html, body {{ margin: 0; height: 100%; }}
#random-image {{ display: flex; align-items: center; justify-content: center; height: 100%; }}
#random-image img {{ max-width: 100%; max-height: 100%; object-fit: contain; }}
</style>
</head>
<body>
<div id="random-image">{body}</div>
</body>
</html>
"#
    )
}
