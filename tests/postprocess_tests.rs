//! Post-processing a finished mirror: site index, HTML/CSS/JS
//! rewriting, script stripping, and php conversion.

use std::fs;
use std::path::Path;

use sitemirror::postprocess::{self, PostProcessConfig};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn build_mirror(root: &Path) {
    write(
        root,
        "index.html",
        r#"<html><head>
            <link rel="canonical" href="http://ex.com/">
            <meta http-equiv="refresh" content="0;url=http://ex.com/">
            <meta property="og:url" content="http://ex.com/">
            <link rel="stylesheet" href="/assets/css/style.css">
        </head><body>
            <a href="http://ex.com/about.html">about</a>
            <a href="/missing-page.html">missing</a>
            <a href="https://other.example/x">external</a>
            <img srcset="/images/bg.png 1x, /images/bg2.png 2x" src="/images/bg.png">
        </body></html>"#,
    );
    write(root, "about.html", r#"<html><body><a href="/">home</a></body></html>"#);
    write(
        root,
        "ru/page/index.html",
        r#"<html><body><a href="/about.html">about</a></body></html>"#,
    );
    write(
        root,
        "assets/css/style.css",
        r#"body { background: url("/images/bg.png"); } @import "/assets/css/extra.css";"#,
    );
    write(root, "assets/css/extra.css", "p { color: red }");
    write(root, "images/bg.png", "png-bytes");
    write(root, "images/bg2.png", "png-bytes");
    write(
        root,
        "js/app.js",
        r#"var page = "http://ex.com/about.html"; var other = "untouched";"#,
    );
}

#[tokio::test]
async fn rewrites_mirror_against_site_index() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    build_mirror(input.path());

    let config = PostProcessConfig::new(input.path(), "ex.com")
        .with_output_dir(output.path())
        .with_workers(2)
        .with_keep_external(true);
    let summary = postprocess::run(config).await.unwrap();

    assert_eq!(summary.failed, 0);
    assert!(summary.processed >= 5);
    assert!(summary.links_rewritten >= 5);
    assert!(summary.external >= 1);

    let index = fs::read_to_string(output.path().join("index.html")).unwrap();
    // Host-absolute page link resolved through the index.
    assert!(index.contains(r#"href="about.html""#), "{index}");
    // Live-site residue removed.
    assert!(!index.contains("canonical"));
    assert!(!index.contains("http-equiv"));
    assert!(!index.contains("og:url"));
    // Missing target preserved without --remove-missing.
    assert!(index.contains(r#"href="/missing-page.html""#));
    // External passed through with --keep-external.
    assert!(index.contains(r#"href="https://other.example/x""#));
    // srcset rewritten per URL, descriptors kept.
    assert!(index.contains("images/bg.png 1x"), "{index}");
    assert!(index.contains("images/bg2.png 2x"));

    // Deep page walks up to the root.
    let deep = fs::read_to_string(output.path().join("ru/page/index.html")).unwrap();
    assert!(deep.contains(r#"href="../../about.html""#), "{deep}");

    // CSS: url() and @import both rewritten; the asset-root
    // short-circuit produces the ../×n walk.
    let css = fs::read_to_string(output.path().join("assets/css/style.css")).unwrap();
    assert!(css.contains(r#"url("../../images/bg.png")"#), "{css}");
    assert!(css.contains(r#"@import "../../assets/css/extra.css""#), "{css}");

    // JS: only the host-bearing literal changes.
    let js = fs::read_to_string(output.path().join("js/app.js")).unwrap();
    assert!(js.contains(r#""../about.html""#), "{js}");
    assert!(js.contains(r#""untouched""#));

    // Binary assets are copied through unchanged.
    assert_eq!(
        fs::read_to_string(output.path().join("images/bg.png")).unwrap(),
        "png-bytes"
    );
}

#[tokio::test]
async fn remove_missing_replaces_dead_and_external_links() {
    let input = TempDir::new().unwrap();
    build_mirror(input.path());
    let output = TempDir::new().unwrap();

    let config = PostProcessConfig::new(input.path(), "ex.com")
        .with_output_dir(output.path())
        .with_remove_missing(true);
    postprocess::run(config).await.unwrap();

    let index = fs::read_to_string(output.path().join("index.html")).unwrap();
    assert!(index.contains(r##"href="#""##), "{index}");
    assert!(!index.contains("missing-page.html"));
    assert!(!index.contains("other.example"));
}

#[tokio::test]
async fn strips_matching_scripts() {
    let input = TempDir::new().unwrap();
    write(
        input.path(),
        "index.html",
        r#"<html><body>
            <script src="https://mc.yandex.ru/metrika/tag.js"></script>
            <script>var keep = 1;</script>
        </body></html>"#,
    );

    let output = TempDir::new().unwrap();
    let config = PostProcessConfig::new(input.path(), "ex.com")
        .with_output_dir(output.path())
        .with_strip_scripts(&["mc\\.yandex".to_string()])
        .unwrap();
    postprocess::run(config).await.unwrap();

    let index = fs::read_to_string(output.path().join("index.html")).unwrap();
    assert!(index.contains("<!-- script removed -->"));
    assert!(!index.contains("mc.yandex"));
    assert!(index.contains("var keep = 1;"));
}

#[tokio::test]
async fn php_conversion_writes_html_and_links_follow() {
    let input = TempDir::new().unwrap();
    write(
        input.path(),
        "index.html",
        r#"<html><body><a href="/cart.php">cart</a></body></html>"#,
    );
    write(
        input.path(),
        "cart.php",
        "<html><body>cart page</body></html>",
    );
    write(input.path(), "raw.php", "<?php echo 1; ?>");

    let output = TempDir::new().unwrap();
    let config = PostProcessConfig::new(input.path(), "ex.com")
        .with_output_dir(output.path())
        .with_php_to_html(true);
    postprocess::run(config).await.unwrap();

    // HTML-bearing php converted, link target follows the rename.
    assert!(output.path().join("cart.html").is_file());
    let index = fs::read_to_string(output.path().join("index.html")).unwrap();
    assert!(index.contains(r#"href="cart.html""#), "{index}");

    // Non-HTML php copied verbatim under its own name.
    let raw = fs::read_to_string(output.path().join("raw.php")).unwrap();
    assert_eq!(raw, "<?php echo 1; ?>");
}
