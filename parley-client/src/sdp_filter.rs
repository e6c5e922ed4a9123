//! Codec-preference rewriting for outgoing session descriptions.
//!
//! The filter is a pure text transform: it moves the preferred codec to the
//! front of every audio media line and pins its channel count and playback rate
//! in the matching `a=fmtp` line. Descriptions without the codec pass through
//! untouched.

/// Codec the local side would like the call to settle on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecPreference {
    /// Encoding name as it appears in `a=rtpmap`, compared case-insensitively.
    pub codec: String,
    pub clock_rate: u32,
    pub channels: u16,
}

impl Default for CodecPreference {
    fn default() -> Self {
        Self {
            codec: "opus".to_string(),
            clock_rate: 48_000,
            channels: 1,
        }
    }
}

impl CodecPreference {
    pub fn apply(&self, sdp: &str) -> String {
        let line_ending = if sdp.contains("\r\n") { "\r\n" } else { "\n" };
        let trailing = sdp.ends_with(line_ending);
        let lines: Vec<&str> = sdp
            .split(line_ending)
            .filter(|line| !line.is_empty())
            .collect();

        let preferred = self.preferred_payload_types(&lines);
        if preferred.is_empty() {
            return sdp.to_string();
        }

        let audio = audio_lines(&lines);
        let has_fmtp: Vec<&str> = lines
            .iter()
            .zip(&audio)
            .filter(|(_, in_audio)| **in_audio)
            .filter_map(|(line, _)| fmtp_payload_type(line))
            .filter(|pt| preferred.contains(pt))
            .collect();

        let mut out: Vec<String> = Vec::with_capacity(lines.len() + preferred.len());
        for (line, in_audio) in lines.iter().zip(audio) {
            if line.starts_with("m=audio ") {
                out.push(self.reorder_media_line(line, &preferred));
                continue;
            }
            if !in_audio {
                out.push(line.to_string());
                continue;
            }

            match fmtp_payload_type(line).filter(|pt| preferred.contains(pt)) {
                Some(pt) => out.push(self.rewrite_fmtp(line, pt)),
                None => out.push(line.to_string()),
            }

            if let Some((pt, _)) = rtpmap(line)
                && preferred.contains(&pt)
                && !has_fmtp.contains(&pt)
            {
                out.push(format!("a=fmtp:{} {}", pt, self.fmtp_params("")));
            }
        }

        let mut rewritten = out.join(line_ending);
        if trailing {
            rewritten.push_str(line_ending);
        }
        rewritten
    }

    /// Payload types in audio sections whose rtpmap names the preferred codec.
    fn preferred_payload_types<'a>(&self, lines: &[&'a str]) -> Vec<&'a str> {
        let mut found = Vec::new();

        for (line, in_audio) in lines.iter().zip(audio_lines(lines)) {
            if !in_audio {
                continue;
            }
            let Some((pt, encoding)) = rtpmap(*line) else {
                continue;
            };

            let mut parts = encoding.split('/');
            let name = parts.next().unwrap_or_default();
            let rate = parts.next().and_then(|r| r.parse::<u32>().ok());
            if name.eq_ignore_ascii_case(&self.codec) && rate == Some(self.clock_rate) {
                found.push(pt);
            }
        }
        found
    }

    fn reorder_media_line(&self, line: &str, preferred: &[&str]) -> String {
        let fields: Vec<&str> = line.split(' ').collect();
        if fields.len() <= 3 {
            return line.to_string();
        }

        let (head, formats) = fields.split_at(3);
        let (mut first, rest): (Vec<&str>, Vec<&str>) =
            formats.iter().partition(|pt| preferred.contains(*pt));
        first.extend(rest);

        let mut reordered = head.to_vec();
        reordered.extend(first);
        reordered.join(" ")
    }

    fn rewrite_fmtp(&self, line: &str, pt: &str) -> String {
        let prefix = format!("a=fmtp:{} ", pt);
        let params = line.strip_prefix(prefix.as_str()).unwrap_or_default();
        format!("{}{}", prefix, self.fmtp_params(params))
    }

    fn fmtp_params(&self, existing: &str) -> String {
        let stereo = if self.channels > 1 { "1" } else { "0" };
        let rate = self.clock_rate.to_string();
        let forced = [
            ("stereo", stereo),
            ("sprop-stereo", stereo),
            ("maxplaybackrate", rate.as_str()),
        ];

        let mut params: Vec<String> = existing
            .split(';')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .filter(|p| {
                let key = p.split('=').next().unwrap_or_default();
                !forced.iter().any(|(k, _)| k.eq_ignore_ascii_case(key))
            })
            .map(str::to_string)
            .collect();

        params.extend(forced.iter().map(|(k, v)| format!("{}={}", k, v)));
        params.join(";")
    }
}

/// For each line, whether it is an attribute of an audio section. Media lines
/// themselves count as outside.
fn audio_lines(lines: &[&str]) -> Vec<bool> {
    let mut in_audio = false;
    lines
        .iter()
        .map(|line| {
            if line.starts_with("m=") {
                in_audio = line.starts_with("m=audio ");
                false
            } else {
                in_audio
            }
        })
        .collect()
}

fn rtpmap(line: &str) -> Option<(&str, &str)> {
    line.strip_prefix("a=rtpmap:")?.split_once(' ')
}

fn fmtp_payload_type(line: &str) -> Option<&str> {
    line.strip_prefix("a=fmtp:")?.split(' ').next()
}
