//! HTML pages for the services directory, MapServer summaries and the
//! ArcGIS JS API preview.

use crate::format::CacheMetadata;

/// ArcGIS Maps SDK for JavaScript release used by the preview page.
const JSAPI_VERSION: &str = "4.29";

const STYLE: &str = r#"
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            margin: 0;
            color: #1f2933;
        }
        header {
            background: #243b53;
            color: #fff;
            padding: 12px 24px;
        }
        header h1 {
            font-size: 18px;
            margin: 0;
        }
        main {
            padding: 16px 24px;
        }
        .formats a {
            margin-right: 12px;
        }
        table {
            border-collapse: collapse;
            font-size: 14px;
        }
        td, th {
            border: 1px solid #d9e2ec;
            padding: 4px 10px;
            text-align: left;
        }
        th {
            background: #f0f4f8;
        }
"#;

/// Escape HTML special characters to prevent XSS attacks.
pub(crate) fn html_escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

/// Encode a string as a JavaScript string literal safe to embed in `<script>`.
fn js_string(s: &str) -> String {
    serde_json::to_string(s)
        .unwrap_or_else(|_| "\"\"".to_string())
        .replace('<', "\\u003c")
}

/// Path of a service's MapServer endpoint, with the name percent-encoded.
pub(crate) fn mapserver_path(name: &str) -> String {
    format!("/rest/services/{}/MapServer", urlencoding::encode(name))
}

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{STYLE}</style>
</head>
<body>
    <header><h1>{title}</h1></header>
    <main>
{body}
    </main>
</body>
</html>
"#
    )
}

/// Services directory listing (`/rest/services`).
pub fn services_directory_html<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    let items: String = names
        .into_iter()
        .map(|name| {
            format!(
                "            <li><a href=\"{}\">{}</a> (MapServer)</li>\n",
                html_escape(&mapserver_path(name)),
                html_escape(name)
            )
        })
        .collect();

    let body = format!(
        r#"        <p class="formats">Supported interfaces: <a href="?f=json">JSON</a> <a href="?f=pjson">PJSON</a></p>
        <h2>Services</h2>
        <ul>
{items}        </ul>"#
    );

    page("Folder: /", &body)
}

/// Summary page for one MapServer service.
pub fn mapserver_html(name: &str, metadata: &CacheMetadata) -> String {
    let escaped_name = html_escape(name);
    let path = html_escape(&mapserver_path(name));

    let sr = &metadata.spatial_reference;
    let spatial_reference = match (sr.wkid, sr.latest_wkid) {
        (Some(wkid), Some(latest)) => format!("{} ({})", wkid, latest),
        (Some(wkid), None) | (None, Some(wkid)) => wkid.to_string(),
        (None, None) => html_escape(sr.wkt.as_deref().unwrap_or("unknown")),
    };

    let lods: String = metadata
        .lods
        .iter()
        .map(|lod| {
            format!(
                "            <tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                lod.level_id, lod.scale, lod.resolution
            )
        })
        .collect();

    let e = &metadata.envelope;
    let body = format!(
        r#"        <p class="formats">View in: <a href="{path}?f=jsapi">ArcGIS JavaScript</a> | Supported interfaces: <a href="{path}?f=json">JSON</a> <a href="{path}?f=pjson">PJSON</a></p>
        <table>
            <tr><th>Tile format</th><td>{format}</td></tr>
            <tr><th>Tile size</th><td>{cols} x {rows}</td></tr>
            <tr><th>Spatial reference</th><td>{spatial_reference}</td></tr>
            <tr><th>Tile origin</th><td>{ox}, {oy}</td></tr>
            <tr><th>Full extent</th><td>{xmin}, {ymin}, {xmax}, {ymax}</td></tr>
            <tr><th>Cache version</th><td>{version}</td></tr>
        </table>
        <h2>Levels of detail</h2>
        <table>
            <tr><th>Level</th><th>Scale</th><th>Resolution</th></tr>
{lods}        </table>"#,
        format = html_escape(&metadata.tile_format),
        cols = metadata.tile_cols,
        rows = metadata.tile_rows,
        ox = metadata.tile_origin.x,
        oy = metadata.tile_origin.y,
        xmin = e.xmin,
        ymin = e.ymin,
        xmax = e.xmax,
        ymax = e.ymax,
        version = html_escape(metadata.declared_version.as_str()),
    );

    page(&format!("{} (MapServer)", escaped_name), &body)
}

/// Interactive map over the service's tiles using the ArcGIS JS API.
pub fn jsapi_html(name: &str) -> String {
    let escaped_name = html_escape(name);
    let service_path = js_string(&mapserver_path(name));

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="initial-scale=1, maximum-scale=1, user-scalable=no">
    <title>{escaped_name} (MapServer)</title>
    <link rel="stylesheet" href="https://js.arcgis.com/{JSAPI_VERSION}/esri/themes/light/main.css">
    <script src="https://js.arcgis.com/{JSAPI_VERSION}/"></script>
    <style>
        html, body, #viewDiv {{
            padding: 0;
            margin: 0;
            height: 100%;
            width: 100%;
        }}
    </style>
    <script>
        require(["esri/Map", "esri/views/MapView", "esri/layers/TileLayer"], function (Map, MapView, TileLayer) {{
            var layer = new TileLayer({{ url: window.location.origin + {service_path} }});
            var map = new Map({{ layers: [layer] }});
            var view = new MapView({{ container: "viewDiv", map: map }});
            layer.when(function () {{
                view.goTo(layer.fullExtent);
            }});
        }});
    </script>
</head>
<body>
    <div id="viewDiv"></div>
</body>
</html>
"#
    )
}
