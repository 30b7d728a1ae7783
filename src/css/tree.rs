//! A lossless-enough CSS tree built on `cssparser` tokens.
//!
//! Every node keeps the source text it was parsed from, so stringifying an
//! unfiltered tree reproduces the input apart from dropped garbage. Decisions
//! are made on the unescaped tokens while the original text is written back.

use cssparser::{Delimiter, ParseError, Parser, ParserInput, SourcePosition, Token};

/// A value component of a property or at-rule prelude.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Component {
    Ident(String),
    /// A function call; `name` is lower-cased.
    Function { name: String, args: Vec<Component> },
    /// An unquoted `url(...)`.
    Url(String),
    BadUrl,
    String(String),
    /// A `()`, `[]` or `{}` block.
    Block(Vec<Component>),
    Whitespace,
    Other,
}

/// Body of an at-rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AtRuleBlock {
    /// No block (`@import "x";`), or a block that was dropped.
    None,
    /// The unparsed text between the braces.
    Raw(String),
    Rules(Vec<CssNode>),
    Properties(Vec<CssNode>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CssNode {
    Whitespace(String),
    /// A comment, including its delimiters.
    Comment(String),
    Property {
        /// Lower-cased name including any `*`/`_` hack prefix.
        name: String,
        components: Vec<Component>,
        raw: String,
        terminated: bool,
    },
    AtRule {
        /// Lower-cased, unescaped name without the `@`.
        name: String,
        /// Source text from the `@` up to the block or semicolon.
        head: String,
        prelude: Vec<Component>,
        block: AtRuleBlock,
    },
    StyleRule {
        selector: String,
        children: Vec<CssNode>,
    },
}

type ParseResult<'i, T> = Result<T, ParseError<'i, ()>>;

/// Parse a declaration list such as the value of a `style` attribute.
pub fn parse_properties(css: &str) -> Vec<CssNode> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    declaration_list(&mut parser)
}

/// Parse a full stylesheet.
pub fn parse_stylesheet(css: &str) -> Vec<CssNode> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    rule_list(&mut parser)
}

/// Write `nodes` back out as CSS text.
pub fn stringify(nodes: &[CssNode]) -> String {
    let mut out = String::new();
    write_nodes(&mut out, nodes);
    out
}

fn write_nodes(out: &mut String, nodes: &[CssNode]) {
    for node in nodes {
        match node {
            CssNode::Whitespace(text) | CssNode::Comment(text) => out.push_str(text),
            CssNode::Property {
                raw, terminated, ..
            } => {
                out.push_str(raw);
                if *terminated {
                    out.push(';');
                }
            }
            CssNode::AtRule { head, block, .. } => {
                out.push_str(head);
                match block {
                    AtRuleBlock::Rules(children) | AtRuleBlock::Properties(children) => {
                        out.push('{');
                        write_nodes(out, children);
                        out.push('}');
                    }
                    AtRuleBlock::Raw(text) => {
                        out.push('{');
                        out.push_str(text);
                        out.push('}');
                    }
                    AtRuleBlock::None => out.push(';'),
                }
            }
            CssNode::StyleRule { selector, children } => {
                out.push_str(selector);
                out.push('{');
                write_nodes(out, children);
                out.push('}');
            }
        }
    }
}

/// Copy `css` without its comments, leaving every other token untouched.
pub fn strip_comments(css: &str) -> String {
    if !css.contains("/*") {
        return css.to_string();
    }
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut out = String::with_capacity(css.len());
    copy_without_comments(&mut parser, &mut out);
    out
}

fn copy_without_comments<'i>(p: &mut Parser<'i, '_>, out: &mut String) {
    loop {
        let start = p.position();
        let token = match p.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        match token {
            Token::Comment(_) => {}
            Token::Function(_)
            | Token::ParenthesisBlock
            | Token::SquareBracketBlock
            | Token::CurlyBracketBlock => {
                out.push_str(p.slice_from(start));
                let mut end = None;
                let _ = p.parse_nested_block(|p| {
                    copy_without_comments(p, out);
                    end = Some(p.position());
                    Ok::<_, ParseError<'i, ()>>(())
                });
                // The closing bracket, if the block was terminated.
                if let Some(end) = end {
                    out.push_str(p.slice_from(end));
                }
            }
            _ => out.push_str(p.slice_from(start)),
        }
    }
}

fn rule_list<'i>(p: &mut Parser<'i, '_>) -> Vec<CssNode> {
    let mut nodes = Vec::new();
    loop {
        let start = p.position();
        let state = p.state();
        let token = match p.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        match token {
            Token::WhiteSpace(text) => nodes.push(CssNode::Whitespace(text.to_string())),
            Token::Comment(text) => nodes.push(CssNode::Comment(format!("/*{text}*/"))),
            Token::CDO | Token::CDC | Token::Semicolon => {}
            Token::AtKeyword(name) => nodes.push(at_rule(p, start, &name)),
            _ => {
                p.reset(&state);
                if let Some(rule) = style_rule(p, start) {
                    nodes.push(rule);
                }
            }
        }
    }
    nodes
}

fn declaration_list<'i>(p: &mut Parser<'i, '_>) -> Vec<CssNode> {
    let mut nodes = Vec::new();
    loop {
        let start = p.position();
        let state = p.state();
        let token = match p.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        match token {
            Token::WhiteSpace(text) => nodes.push(CssNode::Whitespace(text.to_string())),
            Token::Comment(text) => nodes.push(CssNode::Comment(format!("/*{text}*/"))),
            Token::Semicolon => {}
            Token::AtKeyword(name) => nodes.push(at_rule(p, start, &name)),
            _ => {
                p.reset(&state);
                if let Some(property) = declaration(p, start) {
                    nodes.push(property);
                }
            }
        }
    }
    nodes
}

fn declaration<'i>(p: &mut Parser<'i, '_>, start: SourcePosition) -> Option<CssNode> {
    let parsed = p.parse_until_before(Delimiter::Semicolon, |p| property(p));
    let raw = p.slice_from(start).to_string();
    let terminated = p.try_parse(|p| p.expect_semicolon()).is_ok();
    let (name, components) = parsed.ok()?;
    Some(CssNode::Property {
        name,
        components,
        raw,
        terminated,
    })
}

fn property<'i>(p: &mut Parser<'i, '_>) -> ParseResult<'i, (String, Vec<Component>)> {
    let mut name = String::new();
    match p.next()?.clone() {
        Token::Ident(ident) => name.push_str(&ident),
        Token::Delim('*') => {
            name.push('*');
            match p.next_including_whitespace()?.clone() {
                Token::Ident(ident) => name.push_str(&ident),
                token => return Err(p.new_unexpected_token_error(token)),
            }
        }
        token => return Err(p.new_unexpected_token_error(token)),
    }
    p.expect_colon()?;
    Ok((name.to_ascii_lowercase(), components(p)))
}

fn style_rule<'i>(p: &mut Parser<'i, '_>, start: SourcePosition) -> Option<CssNode> {
    let _ = p.parse_until_before(Delimiter::CurlyBracketBlock, |p| {
        skip_all(p);
        Ok::<_, ParseError<'i, ()>>(())
    });
    let selector = p.slice_from(start).to_string();
    if !matches!(p.next(), Ok(Token::CurlyBracketBlock)) {
        return None;
    }
    let children = p
        .parse_nested_block(|p| Ok::<_, ParseError<'i, ()>>(declaration_list(p)))
        .unwrap_or_default();
    Some(CssNode::StyleRule { selector, children })
}

fn at_rule<'i>(p: &mut Parser<'i, '_>, start: SourcePosition, name: &str) -> CssNode {
    let mut prelude = Vec::new();
    let _ = p.parse_until_before(Delimiter::Semicolon | Delimiter::CurlyBracketBlock, |p| {
        prelude = components(p);
        Ok::<_, ParseError<'i, ()>>(())
    });
    let head = p.slice_from(start).to_string();

    let block = if matches!(p.next(), Ok(Token::CurlyBracketBlock)) {
        let text = p
            .parse_nested_block(|p| {
                let inner = p.position();
                skip_all(p);
                Ok::<_, ParseError<'i, ()>>(p.slice_from(inner).to_string())
            })
            .unwrap_or_default();
        AtRuleBlock::Raw(text)
    } else {
        AtRuleBlock::None
    };

    CssNode::AtRule {
        name: name.to_ascii_lowercase(),
        head,
        prelude,
        block,
    }
}

/// Collect the remaining tokens of `p` as components, skipping comments.
fn components<'i>(p: &mut Parser<'i, '_>) -> Vec<Component> {
    let mut out = Vec::new();
    loop {
        let token = match p.next_including_whitespace() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        let component = match token {
            Token::Ident(ident) => Component::Ident(ident.to_string()),
            Token::WhiteSpace(_) => Component::Whitespace,
            Token::UnquotedUrl(url) => Component::Url(url.to_string()),
            Token::BadUrl(_) => Component::BadUrl,
            Token::QuotedString(text) => Component::String(text.to_string()),
            Token::Function(name) => Component::Function {
                name: name.to_ascii_lowercase(),
                args: nested(p),
            },
            Token::ParenthesisBlock | Token::SquareBracketBlock | Token::CurlyBracketBlock => {
                Component::Block(nested(p))
            }
            _ => Component::Other,
        };
        out.push(component);
    }
    out
}

fn nested<'i>(p: &mut Parser<'i, '_>) -> Vec<Component> {
    p.parse_nested_block(|p| Ok::<_, ParseError<'i, ()>>(components(p)))
        .unwrap_or_default()
}

fn skip_all(p: &mut Parser<'_, '_>) {
    while p.next_including_whitespace_and_comments().is_ok() {}
}
