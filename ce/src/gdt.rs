//! GDT 2.1 document construction: fixed-width line framing and the
//! self-referential record-length fixed point.

const RECORD_TYPE_NEW_EXAMINATION_DATA: &str = "6310";
const VERSION: &str = "02.10";
const CHARSET_ISO_8859_1: &str = "2";

/// Render a full GDT document from `content_fields` (field id, content)
/// pairs, in the order they should appear after the fixed header block.
/// Returns the document bytes, ISO-8859-1 encoded.
pub fn build_document(sender_id: &str, receiver_id: &str, content_fields: &[(&str, String)]) -> Vec<u8> {
    let mut header_and_content: Vec<(String, String)> = vec![
        ("9218".to_string(), VERSION.to_string()),
        ("9106".to_string(), sender_id.to_string()),
        ("9103".to_string(), receiver_id.to_string()),
        ("9206".to_string(), CHARSET_ISO_8859_1.to_string()),
    ];
    header_and_content.extend(content_fields.iter().map(|(id, content)| (id.to_string(), content.clone())));

    let record_type_line_len = line_length(RECORD_TYPE_NEW_EXAMINATION_DATA);
    let rest_total: usize = header_and_content.iter().map(|(_, c)| line_length(c)).sum();
    let length_content = fixed_point_length_content(record_type_line_len + rest_total);

    let mut document = String::new();
    document.push_str(&render_line("8000", RECORD_TYPE_NEW_EXAMINATION_DATA));
    document.push_str(&render_line("8100", &length_content));
    for (id, content) in &header_and_content {
        document.push_str(&render_line(id, content));
    }

    encode_iso8859_1(&document)
}

fn render_line(field_id: &str, content: &str) -> String {
    format!("{:03}{field_id}{content}\r\n", line_length(content))
}

/// Total bytes a line with this content will occupy: 3 (length prefix) + 4
/// (field id) + content + 2 (CRLF).
fn line_length(content: &str) -> usize {
    9 + content.chars().count()
}

/// Solve for the record-length line's own content such that the declared
/// length equals the total document length, including the length line
/// itself. Converges in at most a couple of iterations since the digit
/// count of the total changes rarely.
fn fixed_point_length_content(fixed_total: usize) -> String {
    let mut digits = 1usize;
    loop {
        let trial_line_len = 9 + digits;
        let total = fixed_total + trial_line_len;
        let total_str = total.to_string();
        if total_str.len() == digits {
            return total_str;
        }
        digits = total_str.len();
    }
}

fn encode_iso8859_1(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| {
            let codepoint = c as u32;
            if codepoint <= 0xFF {
                codepoint as u8
            } else {
                b'?'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(bytes: &[u8]) -> Vec<String> {
        String::from_utf8_lossy(bytes)
            .split("\r\n")
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn empty_content_line_has_length_nine() {
        let line = render_line("8418", "");
        assert_eq!(line, "0098418\r\n");
        assert_eq!(line.len(), 9);
    }

    #[test]
    fn record_type_line_matches_the_known_scenario_prefix() {
        let bytes = build_document("pghd-ce", "pms", &[]);
        let first_line = lines(&bytes).remove(0);
        assert_eq!(first_line, "01380006310");
    }

    #[test]
    fn declared_record_length_equals_total_byte_length() {
        let bytes = build_document("pghd-ce", "pms", &[("6200", "14012023".into()), ("6201", "225112".into())]);
        let declared: usize = lines(&bytes)[1][7..].parse().unwrap();
        assert_eq!(declared, bytes.len());
    }

    #[test]
    fn record_length_is_numerically_stable_under_recomputation() {
        let long_content: String = "x".repeat(500);
        let bytes = build_document("pghd-ce", "pms", &[("8411", long_content)]);
        let declared: usize = lines(&bytes)[1][7..].parse().unwrap();
        assert_eq!(declared, bytes.len());
    }

    #[test]
    fn every_line_length_prefix_matches_its_own_byte_length() {
        let bytes = build_document("pghd-ce", "pms", &[("8402", "HKElectrocardiogram".into())]);
        let text = String::from_utf8_lossy(&bytes);
        for raw_line in text.split_terminator("\r\n") {
            let declared_len: usize = raw_line[..3].parse().unwrap();
            assert_eq!(declared_len, raw_line.len() + 2);
        }
    }

    #[test]
    fn charset_field_declares_iso_8859_1() {
        let bytes = build_document("pghd-ce", "pms", &[]);
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("9206") && text.contains("2\r\n"));
    }
}
