use std::sync::{Arc, Mutex};

use html_sanitize::{
    Document, NodeKind, OutputFormat, PolicyBuilder, PolicyConfig, RemoveContents,
    SanitizeError, Sanitizer, TransformerEnv, WhitelistDelta,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const MIXED: &str = r#"<b>Lo<!-- comment -->rem</b> <a href="pants" title="foo">ipsum</a> <a href="http://foo.com/"><strong>dolor</strong></a> sit<br/>amet <script>alert("hello world");</script>"#;

fn with(config: &PolicyConfig, html: &str) -> String {
    html_sanitize::fragment(html, config).unwrap()
}

/// Records the names of the elements a transformer is shown, in order.
fn recorder(
    seen: &Arc<Mutex<Vec<String>>>,
) -> impl Fn(&mut TransformerEnv<'_>) -> html_sanitize::Result<WhitelistDelta> + Send + Sync + 'static
{
    let seen = Arc::clone(seen);
    move |env: &mut TransformerEnv<'_>| -> html_sanitize::Result<WhitelistDelta> {
        if env.doc.kind(env.node) == Some(NodeKind::Element) {
            seen.lock().unwrap().push(env.node_name.clone());
        }
        Ok(WhitelistDelta::NoChange)
    }
}

// ---------------------------------------------------------------------------
// Presets
// ---------------------------------------------------------------------------

#[test]
fn default_policy_strips_all_markup() {
    assert_eq!(
        with(PolicyConfig::default_policy(), MIXED),
        r#"Lorem ipsum dolor sit amet alert("hello world");"#
    );
}

#[test]
fn restricted_policy_keeps_inline_formatting() {
    assert_eq!(
        with(PolicyConfig::restricted(), MIXED),
        r#"<b>Lorem</b> ipsum <strong>dolor</strong> sit amet alert("hello world");"#
    );
}

#[test]
fn basic_policy_keeps_links_with_nofollow() {
    assert_eq!(
        with(PolicyConfig::basic(), MIXED),
        r#"<b>Lorem</b> <a href="pants" rel="nofollow">ipsum</a> <a href="http://foo.com/" rel="nofollow"><strong>dolor</strong></a> sit<br>amet alert("hello world");"#
    );
}

#[test]
fn relaxed_policy_filters_image_attributes() {
    assert_eq!(
        with(
            PolicyConfig::relaxed(),
            r#"<img src="javascript:alert(1)" onerror="alert(2)" alt="a">"#
        ),
        r#"<img alt="a">"#
    );
    assert_eq!(
        with(PolicyConfig::relaxed(), r#"<img src="/a.png" alt="a">"#),
        r#"<img src="/a.png" alt="a">"#
    );
}

#[test]
fn empty_input_gives_empty_output() {
    assert_eq!(with(PolicyConfig::relaxed(), ""), "");
}

// ---------------------------------------------------------------------------
// Whitespace elements
// ---------------------------------------------------------------------------

#[test]
fn removed_block_elements_become_spaces() {
    let config = PolicyConfig::default_policy();
    assert_eq!(with(config, "foo<div>bar</div>baz"), "foo bar baz");
    assert_eq!(with(config, "<p>a</p><blockquote>b</blockquote>"), " a  b ");
}

#[test]
fn empty_whitespace_element_only_gets_leading_space() {
    assert_eq!(with(PolicyConfig::default_policy(), "a<br>b"), "a b");
}

#[test]
fn whitespace_elements_can_be_cleared() {
    let config = PolicyBuilder::new().clear_whitespace_elements().build();
    assert_eq!(with(&config, "foo<div>bar</div>baz"), "foobarbaz");
}

// ---------------------------------------------------------------------------
// Removing contents
// ---------------------------------------------------------------------------

#[test]
fn remove_contents_always_drops_subtrees() {
    let config = PolicyBuilder::new()
        .remove_contents(RemoveContents::Always)
        .build();
    assert_eq!(
        with(&config, "foo bar <div>baz<span>quux</span></div>"),
        "foo bar   "
    );
}

#[test]
fn remove_contents_of_named_elements() {
    let config = PolicyBuilder::new()
        .remove_contents_of(["script", "span"])
        .build();
    assert_eq!(
        with(
            &config,
            r#"foo bar <div>baz<span>quux</span> <b>hi</b><script>alert("hello!");</script></div>"#
        ),
        "foo bar  baz hi "
    );
}

// ---------------------------------------------------------------------------
// Protocols
// ---------------------------------------------------------------------------

#[test]
fn obfuscated_javascript_links_lose_their_href() {
    for href in [
        "javascript:alert(1)",
        "JaVaScRiPt:alert(1)",
        "  javascript:alert(1)",
        "&#106;avascript:alert(1)",
        "&#0000106avascript:alert(1)",
        "javascript&#58;alert(1)",
        "javascript&#x3A;alert(1)",
        "java\nscript:alert(1)",
        "java&#x09;script:alert(1)",
        "javascript    :alert(1)",
    ] {
        let html = format!(r#"<a href="{href}">x</a>"#);
        assert_eq!(
            with(PolicyConfig::basic(), &html),
            r#"<a rel="nofollow">x</a>"#,
            "{href:?}"
        );
    }
}

#[test]
fn relative_urls_with_colons_are_relative() {
    assert_eq!(
        with(PolicyConfig::basic(), r#"<a href="/wiki/Special:Random">x</a>"#),
        r#"<a href="/wiki/Special:Random" rel="nofollow">x</a>"#
    );
}

#[test]
fn protocol_checked_values_are_trimmed() {
    assert_eq!(
        with(PolicyConfig::basic(), r#"<a href="  http://example.com/  ">x</a>"#),
        r#"<a href="http://example.com/" rel="nofollow">x</a>"#
    );
}

#[test]
fn spaces_in_urls_are_percent_encoded() {
    assert_eq!(
        with(PolicyConfig::basic(), r#"<a href="http://example.com/a b">x</a>"#),
        r#"<a href="http://example.com/a%20b" rel="nofollow">x</a>"#
    );
}

#[test]
fn unlisted_protocols_are_rejected() {
    assert_eq!(
        with(PolicyConfig::basic(), r#"<a href="data:text/html,hi">x</a>"#),
        r#"<a rel="nofollow">x</a>"#
    );
    assert_eq!(
        with(PolicyConfig::basic(), r#"<a href="mailto:someone@example.com">x</a>"#),
        r#"<a href="mailto:someone@example.com" rel="nofollow">x</a>"#
    );
}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

#[test]
fn data_attributes_follow_naming_rules() {
    let config = PolicyBuilder::new()
        .elements(["div"])
        .data_attributes("div")
        .build();
    assert_eq!(
        with(
            &config,
            r#"<div data-foo="1" data-1="2" data-xml-x="3" title="t">x</div>"#
        ),
        r#"<div data-foo="1">x</div>"#
    );
}

#[test]
fn added_attributes_overwrite_existing_values() {
    assert_eq!(
        with(
            PolicyConfig::basic(),
            r#"<a href="http://example.com/" rel="me">x</a>"#
        ),
        r#"<a href="http://example.com/" rel="nofollow">x</a>"#
    );
}

#[test]
fn attributes_allowed_on_all_elements() {
    let config = PolicyBuilder::new()
        .elements(["b", "i"])
        .all_attributes(["title"])
        .attributes("b", ["class"])
        .build();
    assert_eq!(
        with(&config, r#"<b title="t" class="c">x</b><i title="u" class="d">y</i>"#),
        r#"<b title="t" class="c">x</b><i title="u">y</i>"#
    );
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

#[test]
fn comments_are_removed_by_default() {
    assert_eq!(with(PolicyConfig::relaxed(), "a<!-- b -->c"), "ac");
}

#[test]
fn comments_can_be_allowed() {
    let config = PolicyBuilder::new().allow_comments(true).build();
    assert_eq!(with(&config, "a<!-- b -->c"), "a<!-- b -->c");
}

#[test]
fn comments_can_be_escaped() {
    let config = PolicyBuilder::new().escape_comments(true).build();
    assert_eq!(with(&config, "a<!-- b -->c"), "a&lt;!-- b --&gt;c");
}

// ---------------------------------------------------------------------------
// Documents and doctypes
// ---------------------------------------------------------------------------

#[test]
fn relaxed_documents_keep_the_html5_doctype() {
    assert_eq!(
        html_sanitize::document(
            "<!DOCTYPE html><html><head></head><body>x</body></html>",
            PolicyConfig::relaxed()
        )
        .unwrap(),
        "<!DOCTYPE html><html><head></head><body>x</body></html>"
    );
}

#[test]
fn legacy_doctypes_are_normalized() {
    let html = r#"<!DOCTYPE html PUBLIC "-//W3C//DTD HTML 4.01//EN" "http://www.w3.org/TR/html4/strict.dtd"><html><head></head><body>x</body></html>"#;
    assert_eq!(
        html_sanitize::document(html, PolicyConfig::relaxed()).unwrap(),
        "<!DOCTYPE html><html><head></head><body>x</body></html>"
    );
}

#[test]
fn disallowed_doctypes_are_removed() {
    let config = PolicyBuilder::new()
        .elements(["html", "head", "body"])
        .build();
    assert_eq!(
        html_sanitize::document(
            "<!DOCTYPE html><html><head></head><body>x</body></html>",
            &config
        )
        .unwrap(),
        "<html><head></head><body>x</body></html>"
    );
}

// ---------------------------------------------------------------------------
// Preconditions
// ---------------------------------------------------------------------------

#[test]
fn documents_require_html_to_be_allowed() {
    let err = html_sanitize::document("<p>x</p>", PolicyConfig::basic()).unwrap_err();
    assert!(matches!(err, SanitizeError::Precondition(_)), "{err:?}");
}

#[test]
fn sanitizing_a_document_root_requires_html() {
    let mut doc = Document::parse_document("<p>x</p>");
    let root = doc.root();
    let err = html_sanitize::node(&mut doc, root, PolicyConfig::basic()).unwrap_err();
    assert!(matches!(err, SanitizeError::Precondition(_)), "{err:?}");
}

#[test]
fn nodes_from_another_document_are_rejected() {
    let big = Document::parse_fragment("<p>a</p><p>b</p><p>c</p><p>d</p>");
    let foreign = *big.descendants(big.root()).last().unwrap();
    let mut small = Document::new_fragment();
    let err = html_sanitize::node(&mut small, foreign, PolicyConfig::basic()).unwrap_err();
    assert!(matches!(err, SanitizeError::Precondition(_)), "{err:?}");
}

// ---------------------------------------------------------------------------
// Transformers
// ---------------------------------------------------------------------------

#[test]
fn depth_transformers_see_children_first() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let config = PolicyBuilder::new().transformer(recorder(&seen)).build();
    with(&config, "<div><span>a</span></div><p>b</p>");
    assert_eq!(*seen.lock().unwrap(), ["span", "div", "p"]);
}

#[test]
fn breadth_transformers_see_parents_first() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let config = PolicyBuilder::new()
        .breadth_transformer(recorder(&seen))
        .build();
    with(&config, "<div><span>a</span></div><p>b</p>");
    assert_eq!(*seen.lock().unwrap(), ["div", "span", "p"]);
}

#[test]
fn whitelist_starts_empty_on_every_call() {
    let sizes = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&sizes);
    let config = PolicyBuilder::new()
        .transformer(move |env: &mut TransformerEnv<'_>| -> html_sanitize::Result<WhitelistDelta> {
            recorded.lock().unwrap().push(env.node_whitelist.len());
            Ok(WhitelistDelta::Whitelist(vec![env.node]))
        })
        .build();
    let sanitizer = Sanitizer::new(config);

    // Whitelisted nodes skip the element policy.
    assert_eq!(sanitizer.fragment("<b>x</b>").unwrap(), "<b>x</b>");
    assert_eq!(sanitizer.fragment("<b>x</b>").unwrap(), "<b>x</b>");
    // #text, b and the fragment root, twice.
    assert_eq!(*sizes.lock().unwrap(), [0, 1, 2, 0, 1, 2]);
}

#[test]
fn transformer_can_allow_trusted_embeds() {
    let embed = PolicyBuilder::empty()
        .elements(["iframe"])
        .attributes("iframe", ["frameborder", "height", "src", "width"])
        .build();
    let youtube = move |env: &mut TransformerEnv<'_>| -> html_sanitize::Result<WhitelistDelta> {
        if env.node_name != "iframe" {
            return Ok(WhitelistDelta::NoChange);
        }
        let src = env
            .doc
            .element(env.node)
            .and_then(|element| element.attr("src"))
            .unwrap_or_default()
            .to_string();
        if !src.starts_with("//www.youtube.com/embed/") {
            return Ok(WhitelistDelta::NoChange);
        }
        html_sanitize::node(env.doc, env.node, &embed)?;
        Ok(WhitelistDelta::Whitelist(vec![env.node]))
    };
    let config = PolicyBuilder::from_config(PolicyConfig::basic())
        .transformer(youtube)
        .build();

    assert_eq!(
        with(
            &config,
            r#"<iframe width="420" height="315" src="//www.youtube.com/embed/QH2-TGUlwu4" frameborder="0" onload="alert(1)"></iframe>"#
        ),
        r#"<iframe width="420" height="315" src="//www.youtube.com/embed/QH2-TGUlwu4" frameborder="0"></iframe>"#
    );
    assert_eq!(
        with(&config, r#"<iframe src="http://evil.example/"></iframe>"#),
        ""
    );
}

#[test]
fn transformer_renames_are_seen_by_later_stages() {
    let config = PolicyBuilder::new()
        .elements(["b"])
        .transformer(|env: &mut TransformerEnv<'_>| -> html_sanitize::Result<WhitelistDelta> {
            if env.node_name == "em" {
                env.doc.update_element(env.node, |element| element.set_name("b"));
            }
            Ok(WhitelistDelta::NoChange)
        })
        .build();
    assert_eq!(with(&config, "<em>x</em><i>y</i>"), "<b>x</b>y");
}

#[test]
fn transformer_errors_abort_the_call() {
    let config = PolicyBuilder::new()
        .transformer(|env: &mut TransformerEnv<'_>| -> html_sanitize::Result<WhitelistDelta> {
            if env.node_name == "blink" {
                return Err(SanitizeError::Config("blink is not welcome".to_string()));
            }
            Ok(WhitelistDelta::NoChange)
        })
        .build();
    assert_eq!(with(&config, "<b>fine</b>"), "fine");
    let err = html_sanitize::fragment("<blink>no</blink>", &config).unwrap_err();
    assert!(matches!(err, SanitizeError::Config(msg) if msg.contains("blink")));
}

// ---------------------------------------------------------------------------
// In-place sanitizing
// ---------------------------------------------------------------------------

#[test]
fn fragment_in_place_reports_changes() {
    let sanitizer = Sanitizer::new(PolicyConfig::basic().clone());
    let mut html = String::from("<b>x</b><script>y</script>");
    assert!(sanitizer.fragment_in_place(&mut html).unwrap());
    assert_eq!(html, "<b>x</b>y");
    assert!(!sanitizer.fragment_in_place(&mut html).unwrap());
    assert_eq!(html, "<b>x</b>y");
}

#[test]
fn document_in_place_reports_changes() {
    let sanitizer = Sanitizer::new(PolicyConfig::relaxed().clone());
    let mut html = String::from("<html><head></head><body><p onclick=\"x()\">a</p></body></html>");
    assert!(sanitizer.document_in_place(&mut html).unwrap());
    assert_eq!(html, "<html><head></head><body><p>a</p></body></html>");
    assert!(!sanitizer.document_in_place(&mut html).unwrap());
}

// ---------------------------------------------------------------------------
// Output options
// ---------------------------------------------------------------------------

#[test]
fn ascii_output_uses_character_references() {
    for label in ["ascii", "US-ASCII"] {
        let config = PolicyBuilder::from_config(PolicyConfig::basic())
            .output_encoding(label)
            .build();
        assert_eq!(with(&config, "<b>caf\u{e9}</b>"), "<b>caf&#233;</b>");
    }
}

#[test]
fn unknown_output_encoding_is_a_config_error() {
    let config = PolicyBuilder::new().output_encoding("latin-1").build();
    let err = html_sanitize::fragment("x", &config).unwrap_err();
    assert!(matches!(err, SanitizeError::Config(_)), "{err:?}");
}

#[test]
fn xhtml_output_self_closes_void_elements() {
    let config = PolicyBuilder::from_config(PolicyConfig::basic())
        .output_format(OutputFormat::Xhtml)
        .build();
    assert_eq!(with(&config, "a<br>b"), "a<br />b");
}

// ---------------------------------------------------------------------------
// CSS
// ---------------------------------------------------------------------------

#[test]
fn style_attributes_are_filtered() {
    assert_eq!(
        with(
            PolicyConfig::relaxed(),
            r#"<div style="color: red; foo: bar">x</div>"#
        ),
        r#"<div style="color: red; ">x</div>"#
    );
}

#[test]
fn unsafe_style_attributes_are_removed() {
    for style in [
        "width: expression(alert(1))",
        "behavior: url(x.htc)",
        "background: url(javascript:alert(1))",
    ] {
        let html = format!(r#"<div style="{style}">x</div>"#);
        assert_eq!(with(PolicyConfig::relaxed(), &html), "<div>x</div>", "{style}");
    }
}

#[test]
fn style_elements_are_filtered() {
    assert_eq!(
        with(
            PolicyConfig::relaxed(),
            "<style>p { color: red; behavior: x }</style>"
        ),
        "<style>p { color: red; }</style>"
    );
}

#[test]
fn style_elements_with_nothing_allowed_are_removed() {
    assert_eq!(
        with(
            PolicyConfig::relaxed(),
            "<style>@import url(x.css);</style>x"
        ),
        "x"
    );
}

#[test]
fn css_entry_points() {
    assert_eq!(
        html_sanitize::css_properties(
            "background: url(javascript:alert(1)); color: blue",
            PolicyConfig::relaxed()
        ),
        " color: blue"
    );
    assert_eq!(
        html_sanitize::css_stylesheet(
            "a { color: red } b { width: expression(1) }",
            PolicyConfig::relaxed()
        ),
        "a { color: red } b { }"
    );
    assert_eq!(
        html_sanitize::css_properties("color: red", PolicyConfig::basic()),
        ""
    );
}

// ---------------------------------------------------------------------------
// Input handling
// ---------------------------------------------------------------------------

#[test]
fn unsuitable_characters_are_removed() {
    assert_eq!(
        with(PolicyConfig::default_policy(), "a\u{0}b\u{2028}c\u{202e}d"),
        "abcd"
    );
}

#[test]
fn sanitizing_twice_changes_nothing() {
    let html = r#"<p style="color: red; position: fixed">a <a href="javascript:x">b</a><img src="x.png" onerror="y"></p><!-- c --><script>d</script>"#;
    for config in [
        PolicyConfig::default_policy(),
        PolicyConfig::restricted(),
        PolicyConfig::basic(),
        PolicyConfig::relaxed(),
    ] {
        let once = with(config, html);
        assert_eq!(with(config, &once), once);
    }
}

#[test]
fn subtrees_can_be_sanitized_in_place() {
    let mut doc = Document::parse_fragment("<div><b>x</b>y <i>z</i></div>");
    let root = doc.root();
    let div = doc.first_child(root).unwrap();
    html_sanitize::node(&mut doc, div, PolicyConfig::restricted()).unwrap();
    assert_eq!(
        doc.serialize(root, &Default::default()),
        " <b>x</b>y <i>z</i> "
    );
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[test]
fn one_sanitizer_serves_many_threads() {
    let sanitizer = Sanitizer::new(PolicyConfig::basic().clone());
    let expected = sanitizer.fragment(MIXED).unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| sanitizer.fragment(MIXED).unwrap()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
