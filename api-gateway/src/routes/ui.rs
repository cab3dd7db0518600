//! Minimal HTML pages for the node and network views.
//!
//! The full browser UI is out of scope; these pages exist so the root
//! paths answer something human-readable and point at the JSON API.

use axum::response::Html;

const NODE_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Coin Node</title></head>
<body>
  <h1>Coin Node</h1>
  <p>This node speaks JSON. Useful endpoints:</p>
  <ul>
    <li><code>POST /wallet</code>, <code>GET /wallet</code>, <code>GET /balance</code></li>
    <li><code>POST /transaction</code>, <code>GET /transactions</code></li>
    <li><code>POST /mine</code>, <code>GET /chain</code>, <code>POST /resolveConflicts</code></li>
  </ul>
  <p>See <a href="/network">/network</a> for peer management.</p>
</body>
</html>
"#;

const NETWORK_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Coin Node &mdash; Network</title></head>
<body>
  <h1>Network</h1>
  <p>Peer management endpoints:</p>
  <ul>
    <li><code>GET /nodes</code> &mdash; list peers</li>
    <li><code>POST /node</code> with <code>{"node": "host:port"}</code> &mdash; add a peer</li>
    <li><code>DELETE /node/{host:port}</code> &mdash; remove a peer</li>
  </ul>
</body>
</html>
"#;

/// `GET /`
pub async fn node_page() -> Html<&'static str> {
    Html(NODE_PAGE)
}

/// `GET /network`
pub async fn network_page() -> Html<&'static str> {
    Html(NETWORK_PAGE)
}
