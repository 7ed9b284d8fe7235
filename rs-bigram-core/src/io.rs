use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::{env, fs, io};

const DOUBLE_QUOTES: char = '"';
const COMMA: char = ',';

/// Line-at-a-time iterator over a buffered reader.
///
/// - Yields lines without their `\n` / `\r\n` terminator
/// - A read error (e.g. invalid UTF-8) is yielded once, then iteration stops
/// - Once stopped, keeps returning `None` and drops the reader
#[derive(Debug)]
pub struct LineIterator<R> {
	reader: Option<R>,
}

impl<R: BufRead> LineIterator<R> {
	pub fn new(reader: R) -> Self {
		Self { reader: Some(reader) }
	}

	/// True once the input is exhausted (or failed) and the reader is dropped.
	pub fn reached_end(&self) -> bool {
		self.reader.is_none()
	}
}

impl LineIterator<BufReader<File>> {
	/// Opens `filename` for line iteration.
	pub fn open<P: AsRef<Path>>(filename: P) -> io::Result<Self> {
		Ok(Self::new(BufReader::new(File::open(filename)?)))
	}
}

impl<R: BufRead> Iterator for LineIterator<R> {
	type Item = io::Result<String>;

	fn next(&mut self) -> Option<Self::Item> {
		let reader = self.reader.as_mut()?;
		let mut line = String::new();

		match reader.read_line(&mut line) {
			Ok(0) => {
				self.reader = None;
				None
			}
			Ok(_) => {
				if line.ends_with('\n') {
					line.pop();
					if line.ends_with('\r') {
						line.pop();
					}
				}
				Some(Ok(line))
			}
			Err(e) => {
				self.reader = None;
				Some(Err(e))
			}
		}
	}
}

/// Parses one CSV line into its fields.
///
/// - `,` separates fields, except inside double quotes
/// - `"` toggles quotation mode and is not part of the field
/// - `""` inside a quoted field is a literal `"`
/// - The last (possibly empty) field is always emitted
///
/// Example: `"this , is quoted",plain` → `["this , is quoted", "plain"]`
pub fn parse_record(line: &str) -> Vec<String> {
	let mut fields = Vec::new();
	let mut field = String::new();
	let mut in_quotes = false;
	let mut chars = line.chars().peekable();

	while let Some(c) = chars.next() {
		match c {
			DOUBLE_QUOTES if in_quotes && chars.peek() == Some(&DOUBLE_QUOTES) => {
				field.push(DOUBLE_QUOTES);
				chars.next();
			}
			DOUBLE_QUOTES => in_quotes = !in_quotes,
			COMMA if !in_quotes => fields.push(std::mem::take(&mut field)),
			_ => field.push(c),
		}
	}
	fields.push(field);

	fields
}

/// Returns field `column` (zero-based) of a CSV line, if the line has one.
pub fn extract_column(line: &str, column: usize) -> Option<String> {
	parse_record(line).into_iter().nth(column)
}

/// Collects field `column` of every CSV line in `reader`.
///
/// Lines without that column are skipped.
///
/// # Errors
/// Returns the first read error.
pub fn fields_at_column<R: BufRead>(reader: R, column: usize) -> io::Result<Vec<String>> {
	let mut fields = Vec::new();
	for line in LineIterator::new(reader) {
		if let Some(field) = extract_column(&line?, column) {
			fields.push(field);
		}
	}
	Ok(fields)
}

/// Splits text into word and punctuation tokens.
///
/// Splits on whitespace, then detaches leading and trailing runs of
/// non-alphanumeric characters from each word. Inner punctuation is kept.
///
/// Examples:
/// - `"a banana!"` → `["a", "banana", "!"]`
/// - `"don't"` → `["don't"]`
/// - `"?!"` → `["?!"]`
pub fn tokenize(text: &str) -> Vec<String> {
	let is_symbol = |c: char| !c.is_alphanumeric();
	let mut tokens = Vec::new();

	for word in text.split_whitespace() {
		let core = word.trim_matches(is_symbol);
		if core.is_empty() {
			tokens.push(word.to_owned());
			continue;
		}

		let start = word.len() - word.trim_start_matches(is_symbol).len();
		let end = start + core.len();
		for part in [&word[..start], core, &word[end..]] {
			if !part.is_empty() {
				tokens.push(part.to_owned());
			}
		}
	}

	tokens
}

/// Extracts the base filename without extension.
///
/// Examples:
/// - `"./data/tweets.csv"` → `"tweets"`
/// - `"tweets.csv"` → `"tweets"`
pub fn get_filename<P: AsRef<Path>>(input_path: P) -> io::Result<String> {
	let stem = input_path
		.as_ref()
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no filename"))?;

	Ok(stem.to_string_lossy().to_string())
}

/// Normalize a folder path.
///
/// - `"."` or `"./"` resolves to the current working directory
/// - Other paths are returned as-is (not canonicalized)
pub fn normalize_folder(input: &str) -> PathBuf {
	if input == "." || input == "./" {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		PathBuf::from(input)
	}
}

/// Lists all files with a given extension in a directory.
///
/// Returns file names only (no paths), sorted.
pub fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<String>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let path = entry?.path();
		if path.is_file() && path.extension() == Some(std::ffi::OsStr::new(extension)) {
			if let Some(name) = path.file_name() {
				files.push(name.to_string_lossy().to_string());
			}
		}
	}
	files.sort();

	Ok(files)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Cursor;

	fn lines(text: &str) -> LineIterator<Cursor<&str>> {
		LineIterator::new(Cursor::new(text))
	}

	#[test]
	fn line_iterator_yields_each_line() {
		let mut li = lines("0, The end should come here.\n1, This comes from data with no duplicate words!");
		assert_eq!(li.next().unwrap().unwrap(), "0, The end should come here.");
		assert_eq!(li.next().unwrap().unwrap(), "1, This comes from data with no duplicate words!");
		assert!(li.next().is_none());
		assert!(li.reached_end());
	}

	#[test]
	fn line_iterator_on_empty_input() {
		let mut li = lines("");
		assert!(li.next().is_none());
		assert!(li.next().is_none());
	}

	#[test]
	fn line_iterator_keeps_empty_first_line_and_strips_crlf() {
		let collected: Vec<String> = lines("\n new line\r\nlast\n").collect::<io::Result<_>>().unwrap();
		assert_eq!(collected, vec!["", " new line", "last"]);
	}

	#[test]
	fn line_iterator_reports_invalid_utf8_once() {
		let data: &[u8] = b"first line\nbad \xff byte\nthird line here\n";
		let mut li = LineIterator::new(Cursor::new(data));
		assert_eq!(li.next().unwrap().unwrap(), "first line");
		let err = li.next().unwrap().unwrap_err();
		assert_eq!(err.kind(), io::ErrorKind::InvalidData);
		assert!(li.next().is_none());
		assert!(li.reached_end());
	}

	#[test]
	fn opening_missing_file_fails() {
		assert!(LineIterator::open("definitely/not/here.csv").is_err());
	}

	#[test]
	fn parse_record_splits_on_commas() {
		assert_eq!(
			parse_record("col0, col1, a table and a chair"),
			vec!["col0", " col1", " a table and a chair"]
		);
		assert_eq!(parse_record(""), vec![""]);
		assert_eq!(parse_record("a,"), vec!["a", ""]);
	}

	#[test]
	fn parse_record_honors_quotes() {
		assert_eq!(
			parse_record("\"this , is quoted\",but there are none in this field"),
			vec!["this , is quoted", "but there are none in this field"]
		);
		assert_eq!(parse_record("\"He said \"\"hello\"\"!\""), vec!["He said \"hello\"!"]);
		assert_eq!(parse_record("a,\"\",b"), vec!["a", "", "b"]);
	}

	#[test]
	fn fields_at_column_skips_short_lines() {
		let data = "id,text\n1\n2,\"hi, there\"\n";
		assert_eq!(fields_at_column(Cursor::new(data), 1).unwrap(), vec!["text", "hi, there"]);
		assert_eq!(extract_column("1", 1), None);
	}

	#[test]
	fn tokenize_detaches_outer_punctuation() {
		assert_eq!(tokenize("a banana! and a banana?"), vec!["a", "banana", "!", "and", "a", "banana", "?"]);
		assert_eq!(tokenize("  \"don't\"  stop?! "), vec!["\"", "don't", "\"", "stop", "?!"]);
		assert_eq!(tokenize("... ok"), vec!["...", "ok"]);
		assert!(tokenize("   ").is_empty());
	}

	#[test]
	fn filename_without_extension() {
		assert_eq!(get_filename("./data/tweets.csv").unwrap(), "tweets");
	}
}
