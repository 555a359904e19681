use crate::error::Result;
use crate::models::ImageRow;
use crate::services::ConsoleMode;
use crate::views::html::{checked_if, escape, hidden_unless};

/// Everything the management page shows
#[derive(Debug, Clone)]
pub struct ConsoleView {
    pub mode: ConsoleMode,
    pub items: Vec<ImageRow>,
    /// Last reload failed; `items` is whatever was shown before
    pub load_failed: bool,
}

impl ConsoleView {
    pub fn new(mode: ConsoleMode) -> Self {
        Self {
            mode,
            items: Vec::new(),
            load_failed: false,
        }
    }

    /// Replace the list wholesale on success; keep what is shown on failure
    pub fn apply_reload(&mut self, result: Result<Vec<ImageRow>>) -> bool {
        match result {
            Ok(items) => {
                self.items = items;
                self.load_failed = false;
                true
            }
            Err(_) => {
                self.load_failed = true;
                false
            }
        }
    }
}

pub fn render_console(view: &ConsoleView) -> String {
    let visible = view.mode.visibility();
    let email = match &view.mode {
        ConsoleMode::Authorized(session) => escape(&session.email),
        _ => String::new(),
    };
    let manage = if visible.manage {
        format!(
            r#"
<div class="upload">
<input type="file" id="file-input" accept="image/*" multiple>
<button id="upload-btn" class="btn">Upload</button>
<span id="upload-status"></span>
</div>
<div id="image-list">{}</div>
"#,
            list_markup(&view.items, view.load_failed)
        )
    } else {
        String::new()
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>framewall - manage</title>
<style>{CONSOLE_STYLE}</style>
</head>
<body>
<header>
<h1>Manage images</h1>
<span id="user-email">{email}</span>
<form method="post" action="/auth/logout"{logout_hidden}><button id="logout-btn" class="btn">Log out</button></form>
</header>

<section id="login-section"{login_hidden}>
<p>Sign in to manage images.</p>
<a id="google-login-btn" class="btn" href="/auth/login">Sign in with Google</a>
</section>

<section id="denied-section"{denied_hidden}>
<p>This account is not allowed to manage images.</p>
<form method="post" action="/auth/logout"><button id="denied-logout-btn" class="btn">Log out</button></form>
</section>

<section id="manage-section"{manage_hidden}>{manage}</section>
{script}
</body>
</html>
"#,
        logout_hidden = hidden_unless(visible.logout_button),
        login_hidden = hidden_unless(visible.login),
        denied_hidden = hidden_unless(visible.denied),
        manage_hidden = hidden_unless(visible.manage),
        script = if visible.manage {
            format!("<script>{}</script>", CONSOLE_SCRIPT)
        } else {
            String::new()
        },
    )
}

/// List fragment, also served on its own for reloads
pub fn render_image_list(items: &[ImageRow]) -> String {
    list_markup(items, false)
}

fn list_markup(items: &[ImageRow], load_failed: bool) -> String {
    let rows: String = items.iter().map(render_row).collect();
    format!(
        r#"<div id="images">{rows}</div>
<p id="no-images"{empty_hidden}>No images yet.</p>
<p id="load-error"{error_hidden}>Could not load images.</p>"#,
        empty_hidden = hidden_unless(items.is_empty() && !load_failed),
        error_hidden = hidden_unless(load_failed),
    )
}

fn render_row(item: &ImageRow) -> String {
    let id = escape(&item.id);
    format!(
        r#"
<div class="image-row" data-id="{id}">
<img src="{url}" alt="{filename}">
<div class="info"><div class="filename">{filename}</div><div class="date">{date}</div></div>
<div class="actions">
<label><input type="checkbox" class="flag-toggle" data-flag="published" data-id="{id}"{published}> Published</label>
<label><input type="checkbox" class="flag-toggle" data-flag="dark" data-id="{id}"{dark}> Dark</label>
<button class="btn btn-danger delete-btn" data-id="{id}" data-path="{path}">Delete</button>
</div>
</div>"#,
        url = escape(&item.url),
        filename = escape(&item.filename),
        date = escape(&item.date),
        published = checked_if(item.published),
        dark = checked_if(item.dark),
        path = escape(&item.storage_path),
    )
}

const CONSOLE_STYLE: &str = "
body { font-family: sans-serif; max-width: 60rem; margin: 0 auto; padding: 1rem; }
header { display: flex; gap: 1rem; align-items: center; }
.image-row { display: flex; gap: 1rem; align-items: center; border-bottom: 1px solid #ddd; padding: .5rem 0; }
.image-row img { width: 96px; height: 96px; object-fit: cover; }
.info { flex: 1; }
.btn-danger { color: #b00; }
";

const CONSOLE_SCRIPT: &str = r#"
const fileInput = document.getElementById('file-input');
const uploadBtn = document.getElementById('upload-btn');
const uploadStatus = document.getElementById('upload-status');
const imageList = document.getElementById('image-list');
const jsonHeaders = { 'Content-Type': 'application/json' };

async function reloadList() {
  try {
    const res = await fetch('/manage/images', { credentials: 'same-origin' });
    if (!res.ok) {
      console.error('Error loading images:', res.status);
      return;
    }
    imageList.innerHTML = await res.text();
    bindRows();
  } catch (err) {
    console.error('Error loading images:', err);
  }
}

function bindRows() {
  document.querySelectorAll('.flag-toggle').forEach(cb => cb.addEventListener('change', onToggle));
  document.querySelectorAll('.delete-btn').forEach(btn => btn.addEventListener('click', onDelete));
}

async function onToggle(e) {
  const cb = e.target;
  const value = cb.checked;
  try {
    const res = await fetch(`/api/v1/images/${encodeURIComponent(cb.dataset.id)}/${cb.dataset.flag}`, {
      method: 'PUT', headers: jsonHeaders, body: JSON.stringify({ value })
    });
    const body = await res.json();
    cb.checked = res.ok && body.data ? body.data.checked : !value;
  } catch (err) {
    console.error('Error updating:', err);
    cb.checked = !value;
  }
}

async function onDelete(e) {
  const btn = e.target;
  if (!confirm('Delete this image?')) return;
  try {
    const res = await fetch(`/api/v1/images/${encodeURIComponent(btn.dataset.id)}`, {
      method: 'DELETE', headers: jsonHeaders,
      body: JSON.stringify({ storage_path: btn.dataset.path, confirmed: true })
    });
    const body = await res.json();
    if (res.ok && body.data === 'deleted') {
      reloadList();
    } else {
      console.error('Delete failed:', body);
    }
  } catch (err) {
    console.error('Delete failed:', err);
  }
}

uploadBtn.addEventListener('click', async () => {
  const files = fileInput.files;
  if (!files.length) {
    uploadStatus.textContent = 'Please select files first.';
    return;
  }
  uploadBtn.disabled = true;
  uploadStatus.textContent = `Uploading ${files.length} file(s)...`;
  const form = new FormData();
  for (const file of files) form.append('file', file);
  try {
    const res = await fetch('/api/v1/images', { method: 'POST', body: form });
    const body = await res.json();
    uploadStatus.textContent = res.ok ? body.data.status : body.message;
  } catch (err) {
    console.error('Upload error:', err);
    uploadStatus.textContent = 'Upload failed.';
  }
  uploadBtn.disabled = false;
  fileInput.value = '';
  reloadList();
});

bindRows();
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::Session;

    fn session(email: &str) -> Session {
        Session {
            id: "sid".to_string(),
            user_id: "u1".to_string(),
            email: email.to_string(),
            expires_at: "2099-01-01T00:00:00Z".to_string(),
        }
    }

    fn row(id: &str, published: bool) -> ImageRow {
        ImageRow {
            id: id.to_string(),
            filename: format!("{}.jpg", id),
            storage_path: format!("u1/{}.jpg", id),
            url: format!("https://cdn.test/images/u1/{}.jpg", id),
            date: "2024-05-01".to_string(),
            published,
            dark: false,
        }
    }

    #[test]
    fn test_logged_out_shows_only_login() {
        let html = render_console(&ConsoleView::new(ConsoleMode::LoggedOut));
        assert!(html.contains(r#"<section id="login-section">"#));
        assert!(html.contains(r#"<section id="manage-section" hidden></section>"#));
        assert!(html.contains(r#"<section id="denied-section" hidden>"#));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_denied_has_no_manage_controls() {
        let html = render_console(&ConsoleView::new(ConsoleMode::Denied(session("x@y.z"))));
        assert!(html.contains(r#"<section id="denied-section">"#));
        assert!(!html.contains("file-input"));
        assert!(!html.contains("delete-btn"));
        assert!(!html.contains("<script>"));
        assert!(!html.contains("x@y.z"));
    }

    #[test]
    fn test_authorized_renders_rows() {
        let mut view = ConsoleView::new(ConsoleMode::Authorized(session("owner@example.org")));
        assert!(view.apply_reload(Ok(vec![row("a", true), row("b", false)])));
        let html = render_console(&view);
        assert!(html.contains(r#"<span id="user-email">owner@example.org</span>"#));
        assert!(html.contains(r#"data-flag="published" data-id="a" checked>"#));
        assert!(html.contains(r#"data-flag="published" data-id="b">"#));
        assert!(html.contains(r#"<p id="no-images" hidden>"#));
        assert!(html.contains("<script>"));
    }

    #[test]
    fn test_empty_list_shows_placeholder() {
        let html = render_image_list(&[]);
        assert!(html.contains(r#"<p id="no-images">No images yet.</p>"#));
    }

    #[test]
    fn test_failed_reload_keeps_previous_items() {
        let mut view = ConsoleView::new(ConsoleMode::Authorized(session("owner@example.org")));
        view.apply_reload(Ok(vec![row("a", true)]));
        let replaced = view.apply_reload(Err(AppError::Internal("row store unavailable".to_string())));
        assert!(!replaced);
        assert_eq!(view.items, vec![row("a", true)]);
        assert!(view.load_failed);
    }

    #[test]
    fn test_failed_first_load_is_not_an_empty_list() {
        let mut view = ConsoleView::new(ConsoleMode::Authorized(session("owner@example.org")));
        view.apply_reload(Err(AppError::Internal("row store unavailable".to_string())));
        let html = render_console(&view);
        assert!(html.contains(r#"<p id="no-images" hidden>"#));
        assert!(html.contains(r#"<p id="load-error">Could not load images.</p>"#));

        view.apply_reload(Ok(Vec::new()));
        let html = render_console(&view);
        assert!(html.contains(r#"<p id="no-images">No images yet.</p>"#));
        assert!(html.contains(r#"<p id="load-error" hidden>"#));
    }
}
