//! Rich presence
//!
//! A rich presence script describes what the player is doing as a line of
//! text built from memory. The script is made of sections:
//!
//! ```text
//! Lookup:Location
//! 0=Title Screen
//! 1=Green Hill
//! *=Somewhere
//!
//! Format:Score
//! FormatType=VALUE
//!
//! Display:
//! ?0xH0010=1?Paused in @Location(0xH0000)
//! In @Location(0xH0000), @Score(0x 0002) points
//! ```
//!
//! `Display:` takes any number of `?trigger?text` lines, checked in order,
//! followed by the default line. `@Name(value)` is replaced with the lookup
//! entry or the formatted value for `Name`. `//` starts a comment and `\`
//! makes the next character literal.

use std::collections::HashMap;

use crate::leaderboards::ValueFormat;
use crate::memory::MemoryReader;
use crate::triggers::{parse_trigger, parse_value, ParseMode, Trigger};

/// Value to text table
#[derive(Debug, Clone, Default)]
struct Lookup {
    entries: HashMap<u32, String>,
    /// Text for values with no entry (`*=`)
    fallback: Option<String>,
}

impl Lookup {
    fn add_entry(&mut self, line: &str) {
        let Some((keys, label)) = line.split_once('=') else {
            log::debug!("rich presence: lookup entry without '=' ignored: {:?}", line);
            return;
        };
        for key in keys.split(',').map(str::trim) {
            if key == "*" {
                self.fallback = Some(label.to_string());
                continue;
            }
            match parse_key(key) {
                Some(value) => {
                    self.entries.insert(value, label.to_string());
                }
                None => log::debug!("rich presence: bad lookup key {:?}", key),
            }
        }
    }

    fn get(&self, value: u32) -> &str {
        self.entries
            .get(&value)
            .or(self.fallback.as_ref())
            .map(String::as_str)
            .unwrap_or("")
    }
}

fn parse_key(key: &str) -> Option<u32> {
    match key.strip_prefix("0x").or_else(|| key.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => key.parse().ok(),
    }
}

#[derive(Debug, Clone)]
enum DisplayPart {
    Text(String),
    Macro {
        name: String,
        /// `None` when the value expression did not parse
        value: Option<Trigger>,
        current: u32,
    },
}

#[derive(Debug, Clone)]
struct ConditionalDisplay {
    trigger: Trigger,
    parts: Vec<DisplayPart>,
}

/// Parsed rich presence script
#[derive(Debug, Clone, Default)]
pub struct RichPresence {
    lookups: HashMap<String, Lookup>,
    formats: HashMap<String, ValueFormat>,
    conditions: Vec<ConditionalDisplay>,
    /// Default display line; rich presence is disabled without one
    display: Option<Vec<DisplayPart>>,
}

impl RichPresence {
    /// Parse a script. Malformed lines are skipped with a debug log, so any
    /// text yields a script (possibly a disabled one).
    pub fn parse(script: &str) -> Self {
        let lines: Vec<&str> = script.split('\n').map(strip_comment).collect();
        let mut presence = Self::default();

        let mut index = 0;
        while index < lines.len() {
            let line = lines[index];
            index += 1;

            if let Some(name) = line.strip_prefix("Lookup:") {
                let mut lookup = Lookup::default();
                while let Some(entry) = lines.get(index).filter(|l| !l.is_empty()) {
                    lookup.add_entry(entry);
                    index += 1;
                }
                presence.lookups.insert(name.to_string(), lookup);
            } else if let Some(name) = line.strip_prefix("Format:") {
                if let Some(kind) = lines.get(index).and_then(|l| l.strip_prefix("FormatType=")) {
                    presence.formats.insert(name.to_string(), ValueFormat::parse(kind));
                    index += 1;
                }
            } else if line.starts_with("Display:") {
                while let Some(&entry) = lines.get(index) {
                    index += 1;
                    match entry.strip_prefix('?') {
                        Some(conditional) => presence.add_conditional(conditional),
                        None => {
                            if !entry.is_empty() {
                                presence.display = Some(parse_display(entry));
                            }
                            break;
                        }
                    }
                }
            }
        }

        log::debug!(
            "rich presence: {} lookups, {} formats, {} conditional displays",
            presence.lookups.len(),
            presence.formats.len(),
            presence.conditions.len()
        );
        presence
    }

    fn add_conditional(&mut self, line: &str) {
        let Some((condition, text)) = line.split_once('?') else {
            log::debug!("rich presence: unterminated condition {:?}", line);
            return;
        };
        match parse_trigger(condition, ParseMode::Strict) {
            Ok(trigger) => self.conditions.push(ConditionalDisplay {
                trigger,
                parts: parse_display(text),
            }),
            Err(e) => log::debug!("rich presence: condition {:?} ignored: {}", condition, e),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.display.is_some()
    }

    /// Evaluate against the current frame and build the display string.
    ///
    /// Every condition and value advances its memory history on each call,
    /// whichever line ends up displayed. Returns an empty string when the
    /// script has no default display line.
    pub fn evaluate(&mut self, reader: &dyn MemoryReader) -> String {
        if self.display.is_none() {
            return String::new();
        }

        let mut selected = None;
        for (i, conditional) in self.conditions.iter_mut().enumerate() {
            if conditional.trigger.evaluate(reader).is_true && selected.is_none() {
                selected = Some(i);
            }
        }

        let displays = self
            .conditions
            .iter_mut()
            .map(|c| &mut c.parts)
            .chain(self.display.iter_mut());
        for parts in displays {
            for part in parts.iter_mut() {
                if let DisplayPart::Macro {
                    value: Some(value),
                    current,
                    ..
                } = part
                {
                    *current = value.evaluate_value(reader).as_u32();
                }
            }
        }

        let parts = match (selected, &self.display) {
            (Some(i), _) => &self.conditions[i].parts,
            (None, Some(parts)) => parts,
            (None, None) => return String::new(),
        };
        parts.iter().map(|part| self.render_part(part)).collect()
    }

    fn render_part(&self, part: &DisplayPart) -> String {
        match part {
            DisplayPart::Text(text) => text.clone(),
            DisplayPart::Macro { name, current, .. } => {
                if let Some(lookup) = self.lookups.get(name) {
                    lookup.get(*current).to_string()
                } else if let Some(format) = self.formats.get(name) {
                    format.format(*current)
                } else {
                    String::new()
                }
            }
        }
    }

    /// Reset the memory history of every condition and value
    pub fn reset(&mut self) {
        for conditional in &mut self.conditions {
            conditional.trigger.reset();
        }
        let displays = self
            .conditions
            .iter_mut()
            .map(|c| &mut c.parts)
            .chain(self.display.iter_mut());
        for parts in displays {
            for part in parts.iter_mut() {
                if let DisplayPart::Macro { value, current, .. } = part {
                    if let Some(value) = value {
                        value.reset();
                    }
                    *current = 0;
                }
            }
        }
    }
}

/// Drop a trailing `\r` and any `//` comment along with the whitespace
/// before it. Escaped characters are skipped, so `\//` is not a comment.
fn strip_comment(line: &str) -> &str {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'/' if bytes.get(i + 1) == Some(&b'/') => return line[..i].trim_end(),
            _ => i += 1,
        }
    }
    line
}

fn parse_display(text: &str) -> Vec<DisplayPart> {
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match c {
            // a trailing backslash is dropped
            '\\' => literal.extend(chars.next()),
            '@' => {
                let rest = chars.as_str();
                let Some(open) = rest.find('(') else {
                    log::debug!("rich presence: macro without value in {:?}", text);
                    break;
                };
                let Some(close) = rest[open..].find(')').map(|i| open + i) else {
                    log::debug!("rich presence: unterminated macro in {:?}", text);
                    break;
                };

                if !literal.is_empty() {
                    parts.push(DisplayPart::Text(std::mem::take(&mut literal)));
                }
                let expression = &rest[open + 1..close];
                let value = match parse_value(expression, ParseMode::Lenient) {
                    Ok(value) => Some(value),
                    Err(e) => {
                        log::debug!("rich presence: value {:?} ignored: {}", expression, e);
                        None
                    }
                };
                parts.push(DisplayPart::Macro {
                    name: rest[..open].to_string(),
                    value,
                    current: 0,
                });
                chars = rest[close + 1..].chars();
            }
            _ => literal.push(c),
        }
    }

    if !literal.is_empty() {
        parts.push(DisplayPart::Text(literal));
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBlock;

    fn memory() -> MemoryBlock {
        MemoryBlock::from_bytes(vec![0x00, 0x12, 0x34, 0xAB, 0x56])
    }

    fn render(script: &str, mem: &MemoryBlock) -> String {
        RichPresence::parse(script).evaluate(mem)
    }

    #[test]
    fn test_static_display() {
        let mut presence = RichPresence::parse("Display:\nHello, world!");
        assert!(presence.is_enabled());
        assert_eq!(presence.evaluate(&memory()), "Hello, world!");
    }

    #[test]
    fn test_formatted_value() {
        let script = "Format:Points\nFormatType=VALUE\n\nDisplay:\n@Points(0x 0001) Points";
        let mut presence = RichPresence::parse(script);
        let mut mem = memory();
        assert_eq!(presence.evaluate(&mem), "13330 Points");

        mem.write_u8(1, 20);
        assert_eq!(presence.evaluate(&mem), "13332 Points");
    }

    #[test]
    fn test_value_formula() {
        let script = "Format:Points\nFormatType=VALUE\n\nDisplay:\n@Points(0xH0001*100_0xH0002) Points";
        assert_eq!(render(script, &memory()), "1852 Points");
    }

    #[test]
    fn test_lookup() {
        let script = "Lookup:Location\n0=Zero\n1=One\n\nDisplay:\nAt @Location(0xH0000)";
        let mut presence = RichPresence::parse(script);
        let mut mem = memory();
        assert_eq!(presence.evaluate(&mem), "At Zero");

        mem.write_u8(0, 1);
        assert_eq!(presence.evaluate(&mem), "At One");

        // no entry and no default
        mem.write_u8(0, 2);
        assert_eq!(presence.evaluate(&mem), "At ");
    }

    #[test]
    fn test_lookup_default_entry() {
        let script = "Lookup:Location\n0=Zero\n1=One\n*=Unknown\n\nDisplay:\nAt @Location(0xH0000)";
        let mut presence = RichPresence::parse(script);
        let mut mem = memory();
        assert_eq!(presence.evaluate(&mem), "At Zero");

        mem.write_u8(0, 2);
        assert_eq!(presence.evaluate(&mem), "At Unknown");
    }

    #[test]
    fn test_lookup_hex_keys_and_lists() {
        let script = "Lookup:Location\n0x00=Zero\n0x01,0x02=Low\n0x0A=Ten\n\nDisplay:\nAt @Location(0xH0000)";
        let mut presence = RichPresence::parse(script);
        let mut mem = memory();
        assert_eq!(presence.evaluate(&mem), "At Zero");

        mem.write_u8(0, 2);
        assert_eq!(presence.evaluate(&mem), "At Low");

        mem.write_u8(0, 10);
        assert_eq!(presence.evaluate(&mem), "At Ten");
    }

    #[test]
    fn test_lookup_with_legacy_multiplier() {
        let script = "Lookup:Location\n0=Zero\n1=One\n\nDisplay:\nAt @Location(0xH0000*0.5)";
        let mut presence = RichPresence::parse(script);
        let mut mem = memory();
        assert_eq!(presence.evaluate(&mem), "At Zero");

        mem.write_u8(0, 1);
        assert_eq!(presence.evaluate(&mem), "At Zero");

        mem.write_u8(0, 2);
        assert_eq!(presence.evaluate(&mem), "At One");
    }

    #[test]
    fn test_lookup_keeps_label_whitespace() {
        let script = "Lookup:Location\n0= Zero \n1= One \n\nDisplay:\nAt '@Location(0xH0000)' ";
        assert_eq!(render(script, &memory()), "At ' Zero ' ");
    }

    #[test]
    fn test_crlf_line_endings() {
        let script = "Lookup:Location\r\n0=Zero\r\n1=One\r\n\r\nDisplay:\r\nAt @Location(0xH0000)\r\n";
        let mut presence = RichPresence::parse(script);
        let mut mem = memory();
        assert_eq!(presence.evaluate(&mem), "At Zero");

        mem.write_u8(0, 1);
        assert_eq!(presence.evaluate(&mem), "At One");
    }

    #[test]
    fn test_lookup_after_display() {
        let script = "Display:\nAt @Location(0xH0000)\n\nLookup:Location\n0=Zero\n1=One";
        let mut presence = RichPresence::parse(script);
        let mut mem = memory();
        assert_eq!(presence.evaluate(&mem), "At Zero");

        mem.write_u8(0, 1);
        assert_eq!(presence.evaluate(&mem), "At One");
    }

    #[test]
    fn test_text_outside_sections_ignored() {
        let script = "Locations are fun!\nLookup:Location\n0=Zero\n1=One\n\nDisplay goes here\nDisplay:\nAt @Location(0xH0000)\n\nWritten by User3";
        assert_eq!(render(script, &memory()), "At Zero");
    }

    #[test]
    fn test_comments() {
        let script = "// Location lookup\nLookup:Location // lookup\n0=Zero // 0\n1=One // 1\n\n// Display\nDisplay: // display\nAt @Location(0xH0000) // text";
        let mut presence = RichPresence::parse(script);
        let mut mem = memory();
        assert_eq!(presence.evaluate(&mem), "At Zero");

        mem.write_u8(0, 1);
        assert_eq!(presence.evaluate(&mem), "At One");
    }

    #[test]
    fn test_escapes() {
        let mem = memory();
        assert_eq!(render("Display:\nWhat \\// Where", &mem), "What // Where");
        assert_eq!(render("Display:\nWhat \\\\ Where", &mem), "What \\ Where");
        assert_eq!(render("Display:\nWhat \\/// Where", &mem), "What /");
        assert_eq!(render("Display:\nWhat \\", &mem), "What ");

        let script = "Lookup:Location\n0=Zero\n\nDisplay:\n\\@@Location(0xH0000)";
        assert_eq!(render(script, &mem), "@Zero");
    }

    #[test]
    fn test_conditional_display() {
        let script = "Display:\n?0xH0000=0?Zero\n?0xH0000=1?One\nOther";
        let mut presence = RichPresence::parse(script);
        let mut mem = memory();
        assert_eq!(presence.evaluate(&mem), "Zero");

        mem.write_u8(0, 1);
        assert_eq!(presence.evaluate(&mem), "One");

        mem.write_u8(0, 2);
        assert_eq!(presence.evaluate(&mem), "Other");
    }

    #[test]
    fn test_conditional_display_first_match_wins() {
        let script = "Display:\n?0xH0000=0_0xH0001=18?First\n?0xH0000=0?Second\nOther";
        let mut presence = RichPresence::parse(script);
        let mut mem = memory();
        assert_eq!(presence.evaluate(&mem), "First");

        mem.write_u8(1, 1);
        assert_eq!(presence.evaluate(&mem), "Second");
    }

    #[test]
    fn test_conditional_display_with_macros() {
        let script = "Lookup:Location\n0=Zero\n1=One\n\nDisplay:\n?0xH0001=18?At @Location(0xH0000)\nNear @Location(0xH0000)";
        let mut presence = RichPresence::parse(script);
        let mut mem = memory();
        assert_eq!(presence.evaluate(&mem), "At Zero");

        mem.write_u8(1, 17);
        mem.write_u8(0, 1);
        assert_eq!(presence.evaluate(&mem), "Near One");
    }

    #[test]
    fn test_conditional_lines_after_default_ignored() {
        let script = "Display:\nOther\n?0xH0000=0?Zero";
        assert_eq!(render(script, &memory()), "Other");
    }

    #[test]
    fn test_invalid_condition_never_matches() {
        let script = "Display:\n?BANANA?Zero\n?0xH0000=0?One\nOther";
        let mut presence = RichPresence::parse(script);
        assert_eq!(presence.evaluate(&memory()), "One");
    }

    #[test]
    fn test_no_default_display_disables() {
        let mut presence = RichPresence::parse("Display:\n?0xH0000=0?Zero");
        assert!(!presence.is_enabled());
        assert_eq!(presence.evaluate(&memory()), "");

        assert!(!RichPresence::parse("Lookup:Location\n0=Zero").is_enabled());
        assert!(!RichPresence::parse("").is_enabled());
    }

    #[test]
    fn test_undefined_macro_renders_empty() {
        let script = "Display:\n@Points(0x 0001) Points";
        assert_eq!(render(script, &memory()), " Points");
    }

    #[test]
    fn test_reset_clears_value_history() {
        let script = "Format:Delta\nFormatType=VALUE\n\nDisplay:\n@Delta(d0xH0001)";
        let mut presence = RichPresence::parse(script);
        let mem = memory();
        assert_eq!(presence.evaluate(&mem), "0");
        assert_eq!(presence.evaluate(&mem), "18");

        presence.reset();
        assert_eq!(presence.evaluate(&mem), "0");
    }
}
