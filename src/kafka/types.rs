use rdkafka::Offset;

/// Where a partition consumer starts reading.
///
/// A concrete committed offset resumes exactly there. Anything else (no
/// commit yet, or one of the logical markers) starts from the oldest
/// retained record rather than skipping history.
pub fn resolve_start_offset(committed: Offset) -> Offset {
    match committed {
        Offset::Offset(n) if n >= 0 => Offset::Offset(n),
        _ => Offset::Beginning,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_committed_offset_is_resumed() {
        assert_eq!(resolve_start_offset(Offset::Offset(42)), Offset::Offset(42));
        assert_eq!(resolve_start_offset(Offset::Offset(0)), Offset::Offset(0));
    }

    #[test]
    fn test_markers_start_from_oldest() {
        assert_eq!(resolve_start_offset(Offset::Invalid), Offset::Beginning);
        assert_eq!(resolve_start_offset(Offset::End), Offset::Beginning);
        assert_eq!(resolve_start_offset(Offset::Beginning), Offset::Beginning);
        assert_eq!(resolve_start_offset(Offset::Stored), Offset::Beginning);
        assert_eq!(resolve_start_offset(Offset::Offset(-1)), Offset::Beginning);
    }
}
