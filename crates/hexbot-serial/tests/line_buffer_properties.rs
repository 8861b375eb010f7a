//! LineBuffer 分片无关性测试

use hexbot_serial::LineBuffer;
use proptest::prelude::*;

proptest! {
    /// 无论字节流如何分片到达，切分出的行都相同
    #[test]
    fn test_lines_independent_of_chunking(
        lines in prop::collection::vec("[A-Z0-9+ -]{0,12}", 1..8),
        split_points in prop::collection::vec(any::<prop::sample::Index>(), 0..6),
    ) {
        let stream: Vec<u8> = lines.iter().flat_map(|l| format!("{}\r", l).into_bytes()).collect();

        let mut cuts: Vec<usize> = split_points.iter().map(|i| i.index(stream.len() + 1)).collect();
        cuts.sort_unstable();
        cuts.dedup();

        let mut buf = LineBuffer::new();
        let mut start = 0;
        for cut in cuts {
            buf.push(&stream[start..cut]);
            start = cut;
        }
        buf.push(&stream[start..]);

        let mut received = Vec::new();
        while let Some(line) = buf.next_line() {
            received.push(line);
        }
        prop_assert_eq!(received, lines);
    }
}
