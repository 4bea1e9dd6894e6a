//! Rendition selection.
//!
//! Deterministic and side-effect-free: the same inputs always produce the
//! same URL. Callers decide how far the fallback chain may go; the resolver
//! itself never touches `original_path`/`thumbnail_path` except through
//! [`resolve_display_url`].

use crate::descriptor::{ImageDescriptor, Rendition, RenditionRole};

/// Picks the best rendition for a role and target width.
///
/// Renditions are filtered to the requested role with the preferred encoding;
/// when no preferred-encoding rendition exists for the role, the search widens
/// to any encoding of the same role. Among the candidates the smallest width
/// `>= target_width` wins; when none is large enough, the largest available is
/// returned if `allow_smaller_fallback`, otherwise there is no match.
pub fn resolve_rendition(
    descriptor: &ImageDescriptor,
    role: RenditionRole,
    target_width: u32,
    allow_smaller_fallback: bool,
) -> Option<&Rendition> {
    let preferred: Vec<&Rendition> = descriptor
        .renditions
        .iter()
        .filter(|r| r.role == role && r.encoding == crate::PREFERRED_ENCODING)
        .collect();

    let candidates = if preferred.is_empty() {
        descriptor
            .renditions
            .iter()
            .filter(|r| r.role == role)
            .collect()
    } else {
        preferred
    };

    pick(&candidates, target_width, allow_smaller_fallback)
}

/// URL form of [`resolve_rendition`]
pub fn resolve(
    descriptor: &ImageDescriptor,
    role: RenditionRole,
    target_width: u32,
    allow_smaller_fallback: bool,
) -> Option<&str> {
    resolve_rendition(descriptor, role, target_width, allow_smaller_fallback)
        .map(|r| r.url.as_str())
}

/// Non-strict top-level request: widens across roles when the requested role
/// has no renditions at all, then falls back to the original or thumbnail
/// path. Returns `None` only for a descriptor with no source whatsoever.
pub fn resolve_display_url(
    descriptor: &ImageDescriptor,
    role: RenditionRole,
    target_width: u32,
) -> Option<&str> {
    if let Some(rendition) = resolve_rendition(descriptor, role, target_width, true) {
        return Some(&rendition.url);
    }

    let other_role = match role {
        RenditionRole::Grid => RenditionRole::Detail,
        RenditionRole::Detail => RenditionRole::Grid,
    };
    if let Some(rendition) = resolve_rendition(descriptor, other_role, target_width, true) {
        return Some(&rendition.url);
    }

    if !descriptor.original_path.is_empty() {
        return Some(&descriptor.original_path);
    }
    if !descriptor.thumbnail_path.is_empty() {
        return Some(&descriptor.thumbnail_path);
    }
    None
}

// Candidates are sorted ascending by width (descriptor invariant), so the
// first one that covers the target is also the smallest that does.
fn pick<'a>(
    candidates: &[&'a Rendition],
    target_width: u32,
    allow_smaller_fallback: bool,
) -> Option<&'a Rendition> {
    if let Some(rendition) = candidates.iter().find(|r| r.width >= target_width) {
        return Some(rendition);
    }
    if allow_smaller_fallback {
        return candidates.last().copied();
    }
    None
}
