use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use super::errors::ParseError;

// 占位符内部允许的写法: {} {0} {:3} {:03} {:03d}
const SLOT_SPEC_PATTERN: &str = r"^0?(?::(0)?([1-9]\d*)?d?)?$";

fn slot_spec_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(SLOT_SPEC_PATTERN).expect("占位符正则无效"))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SlotSpec {
    zero_pad: bool,
    width: usize,
}

/// 只带一个编号占位符的模板，例如 `https://x/img{:03}.png`
///
/// 同样的语法也用于图片的本地文件名格式。`{{` 和 `}}` 表示字面量花括号。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    raw: String,
    prefix: String,
    suffix: String,
    spec: SlotSpec,
}

impl UrlTemplate {
    /// 解析模板，占位符数量不是 1 时返回配置错误
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let mut literals: Vec<String> = vec![String::new()];
        let mut specs: Vec<SlotSpec> = Vec::new();

        let mut chars = raw.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    push_literal(&mut literals, '{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    push_literal(&mut literals, '}');
                }
                '{' => {
                    let mut body = String::new();
                    let mut closed = false;
                    for inner in chars.by_ref() {
                        if inner == '}' {
                            closed = true;
                            break;
                        }
                        body.push(inner);
                    }
                    if !closed {
                        return Err(ParseError::InvalidTemplate(format!(
                            "占位符缺少右花括号: {}",
                            raw
                        )));
                    }
                    specs.push(parse_slot_spec(&body, raw)?);
                    literals.push(String::new());
                }
                '}' => {
                    return Err(ParseError::InvalidTemplate(format!(
                        "多余的右花括号: {}",
                        raw
                    )));
                }
                _ => push_literal(&mut literals, c),
            }
        }

        if specs.len() != 1 {
            return Err(ParseError::TemplateSlots {
                template: raw.to_string(),
                found: specs.len(),
            });
        }

        let suffix = literals.pop().unwrap_or_default();
        let prefix = literals.pop().unwrap_or_default();

        Ok(Self {
            raw: raw.to_string(),
            prefix,
            suffix,
            spec: specs[0],
        })
    }

    pub fn format(&self, number: u64) -> String {
        let SlotSpec { zero_pad, width } = self.spec;
        let number = if zero_pad {
            format!("{:0width$}", number, width = width)
        } else {
            format!("{:>width$}", number, width = width)
        };
        format!("{}{}{}", self.prefix, number, self.suffix)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn push_literal(literals: &mut [String], c: char) {
    if let Some(last) = literals.last_mut() {
        last.push(c);
    }
}

fn parse_slot_spec(body: &str, raw: &str) -> Result<SlotSpec, ParseError> {
    let caps = slot_spec_regex().captures(body).ok_or_else(|| {
        ParseError::InvalidTemplate(format!("不支持的占位符格式 {{{}}}: {}", body, raw))
    })?;

    let zero_pad = caps.get(1).is_some();
    let width = match caps.get(2) {
        Some(width) => width.as_str().parse::<usize>()?,
        None => 0,
    };
    Ok(SlotSpec { zero_pad, width })
}
