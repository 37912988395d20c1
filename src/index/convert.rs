use crate::index::GeometryIndex;
use crate::region::RegionId;

/// Carry codes over to the granularity of `target`.
///
/// Codes at least as long as the target's digit count are truncated to their prefix
/// (a 5-digit code becomes its 2-digit region). Shorter codes expand to every target region
/// whose code starts with them. Codes with no counterpart in `target` are dropped.
/// The result is sorted and free of duplicates.
pub fn convert_codes<S: AsRef<str>>(codes: &[S], target: &GeometryIndex) -> Vec<String> {
    let digits = target.granularity().digits();
    let by_code = target.ids_by_code();

    let mut ids: Vec<RegionId> = Vec::new();
    for code in codes.iter().map(|c| c.as_ref().trim()) {
        if code.is_empty() { continue }

        if code.len() >= digits {
            if let Some(id) = code.get(..digits).and_then(|prefix| target.id_of(prefix)) {
                ids.push(id);
            }
        } else {
            let start = by_code.partition_point(|&id| target.code(id) < code);
            ids.extend(by_code[start..].iter()
                .take_while(|&&id| target.code(id).starts_with(code))
                .copied());
        }
    }

    target.codes_of(ids)
}
