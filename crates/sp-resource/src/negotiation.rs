//! HTTP content negotiation (RFC 2616 section 14.1).
//!
//! Each available media type is scored against every range in the `Accept`
//! header. The score is `(fitness, q)` compared lexicographically, where
//! fitness is 100 for a matching type, plus 10 for a matching subtype, plus
//! one per matching parameter. Ties go to the type declared first.

use std::fmt;

use http::{HeaderValue, StatusCode, header};

use crate::message::Response;

/// A parsed media range from an `Accept` header.
#[derive(Debug, Clone, PartialEq)]
struct MediaRange<'a> {
    main: &'a str,
    sub: &'a str,
    params: Vec<(&'a str, &'a str)>,
    q: f32,
}

impl<'a> MediaRange<'a> {
    /// Parse `type/subtype; key=value; q=0.5`.
    ///
    /// A lone `*` means `*/*`. Ranges without a slash are rejected. A missing,
    /// unparseable or out-of-range `q` is treated as 1.
    fn parse(range: &'a str) -> Option<Self> {
        let mut parts = range.split(';');
        let full = parts.next()?.trim();
        let (main, sub) = if full == "*" {
            ("*", "*")
        } else {
            let (main, sub) = full.split_once('/')?;
            (main.trim(), sub.trim())
        };
        if main.is_empty() || sub.is_empty() {
            return None;
        }

        let mut q = 1.0;
        let mut params = Vec::new();
        for param in parts {
            let Some((key, value)) = param.split_once('=') else {
                continue;
            };
            let (key, value) = (key.trim(), value.trim());
            if key == "q" {
                q = value
                    .parse::<f32>()
                    .ok()
                    .filter(|q| (0.0..=1.0).contains(q))
                    .unwrap_or(1.0);
            } else {
                params.push((key, value));
            }
        }

        Some(Self {
            main,
            sub,
            params,
            q,
        })
    }
}

/// Fitness and quality of `target` against the best-fitting range.
///
/// Returns `None` when no range matches.
fn fitness_and_quality(target: &MediaRange<'_>, ranges: &[MediaRange<'_>]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;

    for range in ranges {
        let main_eq = range.main.eq_ignore_ascii_case(target.main);
        let sub_eq = range.sub.eq_ignore_ascii_case(target.sub);
        let main_match = main_eq || range.main == "*" || target.main == "*";
        let sub_match = sub_eq || range.sub == "*" || target.sub == "*";
        if !(main_match && sub_match) {
            continue;
        }

        let param_matches = target
            .params
            .iter()
            .filter(|param| range.params.contains(*param))
            .count();
        let fitness = if main_eq { 100 } else { 0 }
            + if sub_eq { 10 } else { 0 }
            + param_matches;

        if best.is_none_or(|(best_fitness, _)| fitness > best_fitness) {
            best = Some((fitness, range.q));
        }
    }

    best
}

/// Index of the available media type that best satisfies `accept`.
///
/// A type whose best-fitting range has `q=0` is excluded. Returns `None`
/// when nothing is acceptable.
pub fn best_match<S: AsRef<str>>(available: &[S], accept: &str) -> Option<usize> {
    let ranges: Vec<MediaRange<'_>> = accept
        .split(',')
        .map(str::trim)
        .filter(|range| !range.is_empty())
        .filter_map(MediaRange::parse)
        .collect();

    let mut best: Option<(usize, (usize, f32))> = None;
    for (index, media_type) in available.iter().enumerate() {
        let Some(target) = MediaRange::parse(media_type.as_ref()) else {
            continue;
        };
        let Some(score) = fitness_and_quality(&target, &ranges) else {
            continue;
        };
        if score.1 <= 0.0 {
            continue;
        }
        let better = match best {
            None => true,
            Some((_, (fitness, q))) => score.0 > fitness || (score.0 == fitness && score.1 > q),
        };
        if better {
            best = Some((index, score));
        }
    }

    best.map(|(index, _)| index)
}

/// Pick the representation for a request.
///
/// Without an `Accept` value the first declared type is used.
pub fn negotiate<S: AsRef<str>>(
    available: &[S],
    accept: Option<&str>,
) -> Result<usize, NotAcceptable> {
    let result = match accept {
        None if !available.is_empty() => Some(0),
        None => None,
        Some(accept) => best_match(available, accept),
    };
    result.ok_or_else(|| NotAcceptable::new(available))
}

/// No available media type satisfies the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotAcceptable {
    available: Vec<String>,
}

impl NotAcceptable {
    fn new<S: AsRef<str>>(available: &[S]) -> Self {
        Self {
            available: available.iter().map(|s| s.as_ref().to_owned()).collect(),
        }
    }

    /// Media types the resource offers.
    #[must_use]
    pub fn available(&self) -> &[String] {
        &self.available
    }

    /// The 406 response listing the available media types.
    #[must_use]
    pub fn into_response(self) -> Response {
        let mut response = Response::new(StatusCode::NOT_ACCEPTABLE).with_body(self.to_string());
        response.set_header(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        response
    }
}

impl fmt::Display for NotAcceptable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "The following media types are available: {}.",
            self.available.join(", ")
        )
    }
}

impl std::error::Error for NotAcceptable {}
