//! `Accept` header negotiation for the agent media type.
//!
//! Parsing never fails. Entries that are not `type/subtype` are dropped, and
//! a quality value that does not parse leaves the default of `1.0`. The
//! agent type must be named explicitly: `*/*` and `application/*` never
//! select it, so ordinary clients are never opted in by accident.

const AGENT_TYPE: &str = "application";
const AGENT_SUBTYPE: &str = "vnd.hac+json";

/// One entry of an `Accept` header.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaRange {
    pub r#type: String,
    pub subtype: String,
    pub quality: f32,
}

impl MediaRange {
    /// Exact, case-insensitive match against `application/vnd.hac+json`.
    pub fn is_agent_type(&self) -> bool {
        self.r#type.eq_ignore_ascii_case(AGENT_TYPE)
            && self.subtype.eq_ignore_ascii_case(AGENT_SUBTYPE)
    }

    fn parse(entry: &str) -> Option<Self> {
        let mut parts = entry.split(';');
        let (r#type, subtype) = parts.next()?.trim().split_once('/')?;
        let (r#type, subtype) = (r#type.trim(), subtype.trim());
        if r#type.is_empty() || subtype.is_empty() {
            return None;
        }

        let mut quality = 1.0;
        for param in parts {
            let Some((key, value)) = param.split_once('=') else { continue };
            if key.trim().eq_ignore_ascii_case("q") {
                if let Ok(q) = value.trim().parse::<f32>() {
                    quality = q;
                }
            }
        }

        Some(Self { r#type: r#type.to_owned(), subtype: subtype.to_owned(), quality })
    }
}

/// Parses an `Accept` header into media ranges, in header order.
pub fn parse_accept(header: &str) -> Vec<MediaRange> {
    header.split(',').filter_map(|entry| MediaRange::parse(entry.trim())).collect()
}

/// True if the header names the agent media type with `q > 0`.
pub fn wants_agent_context(accept: &str) -> bool {
    parse_accept(accept).iter().any(|mr| mr.is_agent_type() && mr.quality > 0.0)
}

/// True if the agent media type is acceptable and nothing else is.
///
/// Every non-agent range must carry `q=0`. An empty header accepts
/// anything, so it is never agent-only.
pub fn is_only_acceptable(accept: &str) -> bool {
    let mut agent = false;
    for mr in parse_accept(accept) {
        if mr.is_agent_type() {
            agent |= mr.quality > 0.0;
        } else if mr.quality > 0.0 {
            return false;
        }
    }
    agent
}
