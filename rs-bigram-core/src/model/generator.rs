use std::collections::HashSet;
use std::path::Path;

use log::debug;

use crate::error::{MarkovError, Result};
use crate::io::{self, LineIterator};
use super::bigram_chain::BigramChain;
use super::generation_input::GenerationInput;
use super::index_source::{IndexSource, RandomSource};

/// High-level generator built on a single `BigramChain`.
///
/// # Responsibilities
/// - Train one chain from many example sequences (in memory or from files)
/// - Render walks as display strings, attaching punctuation to the
///   previous token
/// - Generate bounded text, retrying when the output only repeats a
///   training sentence
#[derive(Debug, Clone, Default)]
pub struct TextGenerator {
	chain: BigramChain,
	/// Rendered, lowercased training sentences (for duplicate avoidance).
	sentences: HashSet<String>,
}

impl TextGenerator {
	/// Creates a generator trained on every sequence, in order.
	///
	/// Empty sequences are skipped.
	///
	/// # Errors
	/// Returns `InvalidArgument` if a sequence contains an empty token.
	pub fn new<I, J>(sequences: I) -> Result<Self>
	where
		I: IntoIterator<Item = J>,
		J: IntoIterator,
		J::Item: Into<String>,
	{
		let mut generator = Self::default();
		for sequence in sequences {
			generator.train(sequence)?;
		}
		debug!(
			"Trained on {} distinct sentences, {} words with successors",
			generator.sentences.len(),
			generator.chain.words().count()
		);
		Ok(generator)
	}

	/// Creates a generator from every `extension` file in a directory.
	///
	/// # Parameters
	/// - `folder`: Directory containing training files.
	///   `"."` and `"./"` resolve to the working directory.
	/// - `extension`: Extension of the files to load (e.g. `"csv"`).
	/// - `column`: CSV column holding the text, or `None` to use whole lines.
	///
	/// # Errors
	/// - Returns an error if the path is not a directory.
	/// - Returns an error if a file cannot be listed or opened.
	///
	/// # Notes
	/// - Only files directly contained in the directory are loaded
	///   (subdirectories are ignored).
	pub fn from_folder<P: AsRef<Path>>(folder: P, extension: &str, column: Option<usize>) -> Result<Self> {
		let string_path = folder
			.as_ref()
			.to_str()
			.ok_or_else(|| MarkovError::InvalidArgument("Invalid folder path".to_owned()))?;
		let folder = io::normalize_folder(string_path);

		if !folder.is_dir() {
			return Err(MarkovError::InvalidArgument(format!(
				"Expected a directory, got: {}",
				folder.display()
			)));
		}

		let mut generator = Self::default();
		for file in io::list_files(&folder, extension)? {
			generator.train_file(folder.join(&file), column)?;
		}
		Ok(generator)
	}

	/// Creates a generator from a single training file.
	pub fn from_file<P: AsRef<Path>>(filepath: P, column: Option<usize>) -> Result<Self> {
		let mut generator = Self::default();
		generator.train_file(filepath, column)?;
		Ok(generator)
	}

	/// Trains on one sequence of tokens.
	pub fn train<J>(&mut self, sequence: J) -> Result<()>
	where
		J: IntoIterator,
		J::Item: Into<String>,
	{
		let tokens: Vec<String> = sequence.into_iter().map(Into::into).collect();
		let sentence = render(&tokens).to_lowercase();
		self.chain.add_sequence(tokens)?;
		if !sentence.is_empty() {
			self.sentences.insert(sentence);
		}
		Ok(())
	}

	/// Trains on every line of a file, tokenized.
	///
	/// With `column`, each line is read as a CSV record and only that field
	/// is used; lines lacking the field are skipped.
	///
	/// Returns the number of lines trained on.
	///
	/// # Errors
	/// Returns `Io` if the file cannot be opened or a line cannot be read
	/// (e.g. invalid UTF-8). Lines before the failing one stay trained.
	pub fn train_file<P: AsRef<Path>>(&mut self, filepath: P, column: Option<usize>) -> Result<usize> {
		let name = io::get_filename(&filepath)?;
		let mut trained = 0;

		for line in LineIterator::open(&filepath)? {
			let line = line?;
			let text = match column {
				Some(column) => match io::extract_column(&line, column) {
					Some(field) => field,
					None => continue,
				},
				None => line,
			};
			self.train(io::tokenize(&text))?;
			trained += 1;
		}

		debug!("Trained {} lines from '{}'", trained, name);
		Ok(trained)
	}

	/// Read-only access to the trained chain.
	pub fn chain(&self) -> &BigramChain {
		&self.chain
	}

	/// Generates one text using a fresh random source.
	pub fn generate(&self) -> Result<String> {
		self.generate_with(&mut RandomSource::new())
	}

	/// Generates one text from a complete walk driven by `source`.
	///
	/// An untrained generator yields an empty string.
	pub fn generate_with<S: IndexSource + ?Sized>(&self, source: &mut S) -> Result<String> {
		self.bounded_walk(0, source)
	}

	/// Generates text according to `input`.
	///
	/// # Behavior
	/// - Stops the walk after `max_tokens` tokens (if non-zero).
	/// - While the text equals a training sentence (case-insensitive),
	///   generates again, at most `nb_try` more times.
	/// - Returns the last attempt if every attempt was a duplicate.
	pub fn predict<S: IndexSource + ?Sized>(&self, input: &GenerationInput, source: &mut S) -> Result<String> {
		let mut text = self.bounded_walk(input.max_tokens(), source)?;
		let mut nb_try = input.nb_try;

		while nb_try > 0 && self.is_known(&text) {
			debug!("'{}' already exists, {} tries left", text, nb_try);
			text = self.bounded_walk(input.max_tokens(), source)?;
			nb_try -= 1;
		}

		Ok(text)
	}

	/// True if `text` is one of the training sentences (case-insensitive).
	pub fn is_known(&self, text: &str) -> bool {
		self.sentences.contains(&text.to_lowercase())
	}

	fn bounded_walk<S: IndexSource + ?Sized>(&self, max_tokens: usize, source: &mut S) -> Result<String> {
		let walk = self.chain.get_walk(source);
		let tokens: Vec<&str> = if max_tokens == 0 {
			walk.collect::<Result<_>>()?
		} else {
			walk.take(max_tokens).collect::<Result<_>>()?
		};
		Ok(render(&tokens))
	}
}

/// True if `token` is made only of punctuation or symbol characters.
pub fn is_punctuation(token: &str) -> bool {
	!token.is_empty() && token.chars().all(|c| !c.is_alphanumeric() && !c.is_whitespace())
}

/// Joins tokens into display text.
///
/// The first token has no prefix; punctuation tokens attach directly to
/// the previous token; every other token is preceded by one space.
pub fn render<S: AsRef<str>>(tokens: &[S]) -> String {
	let mut text = String::new();
	for (i, token) in tokens.iter().enumerate() {
		let token = token.as_ref();
		if i > 0 && !is_punctuation(token) {
			text.push(' ');
		}
		text.push_str(token);
	}
	text
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::index_source::ReplaySource;

	#[test]
	fn render_attaches_punctuation() {
		assert_eq!(render(&["Hello", "!", "name", "is", "Johnny"]), "Hello! name is Johnny");
		assert_eq!(render(&["wait", "...", "what", "?!"]), "wait... what?!");
		assert_eq!(render(&["!", "start"]), "! start");
		assert_eq!(render::<&str>(&[]), "");
	}

	#[test]
	fn punctuation_detection() {
		assert!(is_punctuation("?"));
		assert!(is_punctuation("…"));
		assert!(!is_punctuation("a."));
		assert!(!is_punctuation("42"));
		assert!(!is_punctuation(""));
	}

	#[test]
	fn untrained_generator_yields_empty_text() {
		let generator = TextGenerator::new(Vec::<Vec<String>>::new()).unwrap();
		assert_eq!(generator.generate().unwrap(), "");
		let mut source = ReplaySource::new([3]).unwrap();
		assert_eq!(generator.predict(&GenerationInput::new(5, 3).unwrap(), &mut source).unwrap(), "");
	}

	#[test]
	fn single_word_is_always_generated() {
		let generator = TextGenerator::new(vec![vec!["word"]]).unwrap();
		assert_eq!(generator.generate().unwrap(), "word");
	}

	#[test]
	fn max_tokens_truncates_looping_walks() {
		let generator = TextGenerator::new(vec![vec!["la", "la"]]).unwrap();
		// "la" -> {END:1, la:1}: index 1 keeps looping
		let mut source = ReplaySource::new([1]).unwrap();
		let input = GenerationInput::new(4, 0).unwrap();
		assert_eq!(generator.predict(&input, &mut source).unwrap(), "la la la la");
	}

	#[test]
	fn predict_retries_known_sentences() {
		let generator = TextGenerator::new(vec![vec!["a", "b"], vec!["a", "c"]]).unwrap();
		// start a (0), b (0), END (0) -> "a b" is known; then a (0), c (1), END (0)
		let mut source = ReplaySource::new([0, 0, 0, 0, 1, 0]).unwrap();
		let input = GenerationInput::new(0, 1).unwrap();
		assert_eq!(generator.predict(&input, &mut source).unwrap(), "a c");

		let mut source = ReplaySource::new([0, 0, 0]).unwrap();
		let input = GenerationInput::new(0, 2).unwrap();
		assert_eq!(generator.predict(&input, &mut source).unwrap(), "a b");
	}

	#[test]
	fn invalid_token_is_reported() {
		assert!(matches!(
			TextGenerator::new(vec![vec!["ok", ""]]),
			Err(MarkovError::InvalidArgument(_))
		));
	}
}
