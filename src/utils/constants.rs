//! Shared configuration constants for sitemirror
//!
//! This module contains default values and the fixed lookup tables used
//! throughout the codebase to ensure consistency and avoid magic numbers.

/// Default number of concurrent crawl workers
///
/// Conservative default that keeps most origins comfortable while still
/// saturating typical home connections. Users can raise it for fast
/// servers or local testing.
pub const DEFAULT_WORKERS: usize = 4;

/// Default maximum crawl depth: 5 levels
///
/// Limits how deep the crawler will follow links from the starting URL.
/// Helps prevent unbounded crawling while capturing most relevant content.
pub const DEFAULT_MAX_DEPTH: u32 = 5;

/// Default retry attempts per URL before the fetch counts as failed
pub const DEFAULT_RETRIES: u32 = 3;

/// Default base delay between retry attempts, in milliseconds
///
/// Each retry sleeps this long plus up to one extra second of jitter so
/// concurrent workers do not hammer a recovering server in lockstep.
pub const DEFAULT_DELAY_MS: u64 = 1000;

/// Default per-file size cap: 50 MB
///
/// A response body exceeding the cap is a terminal error for that URL;
/// the crawl moves on.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Default user agent sent with every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";

/// Frontier capacity; enqueue blocks when the queue holds this many URLs
pub const FRONTIER_CAPACITY: usize = 5000;

/// How many leading bytes the save-strategy analyzer sniffs for HTML markers
pub const SNIFF_WINDOW: usize = 100;

/// Static `Accept` header sent by the fetcher
pub const ACCEPT_HEADER: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

/// Static `Accept-Language` header sent by the fetcher
pub const ACCEPT_LANGUAGE_HEADER: &str = "ru-RU,ru;q=0.9,en-US;q=0.8,en;q=0.7";

/// Extensions that mark a URL as a static asset.
///
/// Asset URLs are in scope even outside the configured base path, and are
/// always saved with the FileOnly strategy.
pub const STATIC_ASSET_EXTENSIONS: &[&str] = &[
    "css", "js", "mjs", "json", "map", "png", "jpg", "jpeg", "gif", "webp", "svg", "ico", "bmp",
    "avif", "woff", "woff2", "ttf", "otf", "eot", "mp3", "mp4", "webm", "ogg", "ogv", "wav", "m4a",
    "avi", "mov", "pdf",
];

/// Extensions that mark a path as a server-rendered page
pub const PAGE_EXTENSIONS: &[&str] = &["php", "html", "htm", "asp", "aspx", "jsp"];

/// Path segments that mark a URL as living in a resource directory
pub const RESOURCE_DIR_SEGMENTS: &[&str] = &[
    "/static/",
    "/assets/",
    "/public/",
    "/resources/",
    "/css/",
    "/js/",
    "/images/",
    "/img/",
    "/fonts/",
    "/uploads/",
    "/media/",
    "/downloads/",
];

/// Path segments that mark an extension-less URL as an API endpoint
pub const API_PATH_SEGMENTS: &[&str] = &["/api/", "/ajax/", "/rest/", "/graphql", "/auth/"];

/// Substrings that drop a raw link at parse time.
///
/// Tracker shortcodes, donation platforms, and messenger handles; following
/// them never yields mirrorable content.
pub const DOMAIN_DENYLIST: &[&str] = &[
    "mc.yandex",
    "google-analytics",
    "googletagmanager",
    "donationalerts",
    "boosty.to",
    "paypal.me",
    "patreon.com",
    "t.me/",
    "wa.me/",
];

/// Well-known paths seeded at job start to improve site coverage
pub const DISCOVERY_PATHS: &[&str] = &[
    "/404",
    "/404.html",
    "/robots.txt",
    "/sitemap.xml",
    "/favicon.ico",
    "/apple-touch-icon.png",
    "/manifest.json",
];

/// Attributes the post-processor rewrites on every element.
///
/// `content` is handled separately: it is rewritten on `<meta>` only.
pub const LINK_ATTRIBUTES: &[&str] = &[
    "href",
    "src",
    "action",
    "data-src",
    "data-href",
    "poster",
    "srcset",
    "cite",
    "formaction",
    "icon",
    "manifest",
    "archive",
    "codebase",
    "data",
    "usemap",
    "background",
];

/// Top-level mirror directories treated as asset roots by the
/// post-processor's short-circuit relative-path rule
pub const ASSET_ROOT_DIRS: &[&str] = &[
    "assets", "css", "js", "images", "img", "fonts", "static", "media",
];

/// File extensions the post-processor rewrites; everything else is copied
pub const PROCESSABLE_EXTENSIONS: &[&str] =
    &["html", "htm", "xhtml", "php", "css", "scss", "less", "js"];
