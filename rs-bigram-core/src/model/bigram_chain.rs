use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::iter::FusedIterator;

use log::trace;

use crate::error::{MarkovError, Result};
use super::distribution::WeightedDistribution;
use super::index_source::IndexSource;

/// Label of `Token::End` in dumps and in rank order.
pub const END_LABEL: &str = "<END>";

/// A successor recorded in the chain.
///
/// `End` marks the end of a training sequence. It is its own variant, so no
/// trained word can ever be mistaken for it.
///
/// Tokens are ordered by their label, `End` comparing as `"<END>"`: it comes
/// after words starting with `!`, `,`, `.` or a digit, and before letters.
/// A word spelled `"<END>"` sorts right after `End`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Token {
	End,
	Word(String),
}

impl Token {
	/// Returns the word, or `None` for `End`.
	pub fn as_word(&self) -> Option<&str> {
		match self {
			Token::End => None,
			Token::Word(word) => Some(word),
		}
	}

	fn label(&self) -> &str {
		self.as_word().unwrap_or(END_LABEL)
	}
}

impl Ord for Token {
	fn cmp(&self, other: &Self) -> Ordering {
		self.label()
			.cmp(other.label())
			.then_with(|| self.as_word().is_some().cmp(&other.as_word().is_some()))
	}
}

impl PartialOrd for Token {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl From<&str> for Token {
	fn from(word: &str) -> Self {
		Token::Word(word.to_owned())
	}
}

impl From<String> for Token {
	fn from(word: String) -> Self {
		Token::Word(word)
	}
}

impl Display for Token {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Token::End => write!(f, "{}", END_LABEL),
			Token::Word(word) => write!(f, "{}", word),
		}
	}
}

/// First-order Markov chain over word tokens.
///
/// # Responsibilities
/// - Count which words start a sequence
/// - Count, for every word, which token follows it (including `End`)
/// - Produce lazy walks driven by an `IndexSource`
/// - Recover the indices that make a walk reproduce a given sequence
///
/// # Invariants
/// - Words are never empty
/// - A word has a successor distribution iff it was followed by something
///   in training, and that distribution's total is the number of times it
///   was followed (by a word or by `End`)
/// - Every trained non-empty sequence adds exactly one transition into `End`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BigramChain {
	/// First token of every trained non-empty sequence.
	start_tokens: WeightedDistribution<String>,

	/// Mapping from a word to the distribution of tokens following it.
	successors: BTreeMap<String, WeightedDistribution<Token>>,
}

impl BigramChain {
	/// Creates an untrained chain.
	pub fn new() -> Self {
		Self::default()
	}

	pub fn start_tokens(&self) -> &WeightedDistribution<String> {
		&self.start_tokens
	}

	/// Successor distribution of `word`, if it was ever followed by something.
	pub fn successors(&self, word: &str) -> Option<&WeightedDistribution<Token>> {
		self.successors.get(word)
	}

	/// Every word with recorded successors, in natural order.
	pub fn words(&self) -> impl Iterator<Item = &str> {
		self.successors.keys().map(String::as_str)
	}

	/// True when no sequence has been trained, i.e. every walk is empty.
	pub fn is_empty(&self) -> bool {
		self.start_tokens.is_empty()
	}

	/// Records that `next` was observed right after `prev`.
	///
	/// # Errors
	/// Returns `InvalidArgument` if `prev` is empty or `next` is an empty word.
	pub fn add_bigram(&mut self, prev: &str, next: Token) -> Result<()> {
		if prev.is_empty() {
			return Err(MarkovError::InvalidArgument("bigram source token is empty".to_owned()));
		}
		if next.as_word().is_some_and(str::is_empty) {
			return Err(MarkovError::InvalidArgument("bigram target token is empty".to_owned()));
		}
		self.record_transition(prev, next);
		Ok(())
	}

	/// Trains the chain on one sequence of tokens.
	///
	/// - Records the first token as a start token.
	/// - Records every consecutive pair as a bigram.
	/// - Records a final transition from the last token to `End`.
	///
	/// An empty sequence is a no-op.
	///
	/// # Errors
	/// Returns `InvalidArgument` if any token is empty. The whole sequence is
	/// checked first, so a rejected sequence leaves the chain unchanged.
	pub fn add_sequence<I>(&mut self, tokens: I) -> Result<()>
	where
		I: IntoIterator,
		I::Item: Into<String>,
	{
		let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
		if let Some(position) = tokens.iter().position(String::is_empty) {
			return Err(MarkovError::InvalidArgument(format!(
				"empty token at position {}",
				position
			)));
		}

		let (Some(first), Some(last)) = (tokens.first(), tokens.last()) else {
			return Ok(());
		};

		self.start_tokens.record(first.clone());
		for pair in tokens.windows(2) {
			self.record_transition(&pair[0], Token::Word(pair[1].clone()));
		}
		self.record_transition(last, Token::End);

		trace!("trained sequence of {} tokens starting with {:?}", tokens.len(), first);
		Ok(())
	}

	fn record_transition(&mut self, prev: &str, next: Token) {
		self.successors.entry(prev.to_owned()).or_default().record(next);
	}

	/// Returns a lazy walk through the chain driven by `source`.
	///
	/// The walk consumes one index per produced token, plus one for the
	/// final pick of `End`. It may never terminate if the chain has cycles
	/// and the source keeps choosing them: bound it with `take` if needed.
	pub fn get_walk<'a, 's, S: IndexSource + ?Sized>(&'a self, source: &'s mut S) -> Walk<'a, 's, S> {
		Walk {
			chain: self,
			source,
			state: WalkState::Start,
		}
	}

	/// Finds the indices that make a replayed walk produce exactly `tokens`
	/// and then stop.
	///
	/// The result is one element longer than `tokens`: the start index, one
	/// index per transition, and the index of `End` after the last token.
	///
	/// # Errors
	/// Returns `InvalidArgument` if `tokens` is empty, or if a start token or
	/// transition it requires was never trained.
	pub fn find_walk_choices<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Vec<usize>> {
		let (Some(first), Some(last)) = (tokens.first(), tokens.last()) else {
			return Err(MarkovError::InvalidArgument(
				"cannot find choices for an empty walk".to_owned(),
			));
		};

		let mut choices = Vec::with_capacity(tokens.len() + 1);
		choices.push(self.start_tokens.index(first.as_ref())?);
		for pair in tokens.windows(2) {
			let next = Token::from(pair[1].as_ref());
			choices.push(self.transitions_from(pair[0].as_ref())?.index(&next)?);
		}
		choices.push(self.transitions_from(last.as_ref())?.index(&Token::End)?);

		Ok(choices)
	}

	fn transitions_from(&self, word: &str) -> Result<&WeightedDistribution<Token>> {
		self.successors.get(word).ok_or_else(|| {
			MarkovError::InvalidArgument(format!("no transition recorded from {:?}", word))
		})
	}
}

impl Display for BigramChain {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "start tokens: {}", self.start_tokens)?;
		writeln!(f, "bigrams:")?;
		for (word, successors) in &self.successors {
			writeln!(f, "  \"{}\": {}", word, successors)?;
		}
		Ok(())
	}
}

#[derive(Clone, Copy, Debug)]
enum WalkState<'a> {
	/// Nothing produced yet.
	Start,
	/// Last produced word.
	At(&'a str),
	Done,
}

/// Lazy, single-pass walk through a `BigramChain`.
///
/// Yields words borrowed from the chain until `End` is picked. An error
/// (from the source or from a broken chain) is yielded once, after which
/// the walk is over.
/// Each call to `next` consults the source at most once.
pub struct Walk<'a, 's, S: ?Sized> {
	chain: &'a BigramChain,
	source: &'s mut S,
	state: WalkState<'a>,
}

impl<'a, S: IndexSource + ?Sized> Walk<'a, '_, S> {
	fn start(&mut self) -> Result<Option<&'a str>> {
		let chain = self.chain;
		if chain.start_tokens.is_empty() {
			return Ok(None);
		}
		let word = chain.start_tokens.pick_from(&mut *self.source)?;
		trace!("walk starts at {:?}", word);
		Ok(Some(word.as_str()))
	}

	fn advance(&mut self, current: &'a str) -> Result<Option<&'a str>> {
		let chain = self.chain;
		let successors = chain.successors.get(current).ok_or_else(|| {
			MarkovError::IllegalState(format!("{:?} was produced but has no successors", current))
		})?;

		let next = successors.pick_from(&mut *self.source)?;
		trace!("walk {:?} -> {}", current, next);
		Ok(next.as_word())
	}
}

impl<'a, S: IndexSource + ?Sized> Iterator for Walk<'a, '_, S> {
	type Item = Result<&'a str>;

	fn next(&mut self) -> Option<Self::Item> {
		let step = match self.state {
			WalkState::Done => return None,
			WalkState::Start => self.start(),
			WalkState::At(current) => self.advance(current),
		};

		match step {
			Ok(Some(word)) => {
				self.state = WalkState::At(word);
				Some(Ok(word))
			}
			Ok(None) => {
				self.state = WalkState::Done;
				None
			}
			Err(e) => {
				self.state = WalkState::Done;
				Some(Err(e))
			}
		}
	}
}

impl<S: IndexSource + ?Sized> FusedIterator for Walk<'_, '_, S> {}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::index_source::ReplaySource;

	fn words(sentence: &str) -> Vec<&str> {
		sentence.split(' ').collect()
	}

	#[test]
	fn add_bigram_creates_distribution() {
		let mut mc = BigramChain::new();
		mc.add_bigram("1", Token::from("2")).unwrap();
		let pd = mc.successors("1").unwrap();
		assert_eq!(pd.count(&Token::from("2")).unwrap(), 1);
		assert!(mc.successors("2").is_none());
	}

	#[test]
	fn add_bigram_rejects_empty_tokens() {
		let mut mc = BigramChain::new();
		assert!(matches!(mc.add_bigram("", Token::from("2")), Err(MarkovError::InvalidArgument(_))));
		assert!(matches!(mc.add_bigram("1", Token::from("")), Err(MarkovError::InvalidArgument(_))));
		assert_eq!(mc, BigramChain::new());
	}

	#[test]
	fn add_sequence_records_bigrams_and_end() {
		let mut mc = BigramChain::new();
		mc.add_sequence(words("1 2 3")).unwrap();

		assert_eq!(mc.words().collect::<Vec<_>>(), vec!["1", "2", "3"]);
		assert_eq!(mc.successors("1").unwrap().count(&Token::from("2")).unwrap(), 1);
		assert_eq!(mc.successors("2").unwrap().count(&Token::from("3")).unwrap(), 1);
		assert_eq!(mc.successors("3").unwrap().count(&Token::End).unwrap(), 1);
		assert_eq!(mc.start_tokens().count("1").unwrap(), 1);
	}

	#[test]
	fn single_token_sequence_goes_straight_to_end() {
		let mut mc = BigramChain::new();
		mc.add_sequence(["word"]).unwrap();
		let pd = mc.successors("word").unwrap();
		assert_eq!(pd.keys().collect::<Vec<_>>(), vec![&Token::End]);
		assert_eq!(pd.total(), 1);
	}

	#[test]
	fn empty_sequence_is_a_no_op() {
		let mut mc = BigramChain::new();
		mc.add_sequence(Vec::<String>::new()).unwrap();
		assert!(mc.is_empty());
		assert_eq!(mc.words().count(), 0);
	}

	#[test]
	fn rejected_sequence_leaves_chain_unchanged() {
		let mut mc = BigramChain::new();
		mc.add_sequence(words("a b")).unwrap();
		let before = mc.clone();

		assert!(matches!(
			mc.add_sequence(["c", "", "d"]),
			Err(MarkovError::InvalidArgument(_))
		));
		assert_eq!(mc, before);
	}

	#[test]
	fn end_ranks_like_its_label() {
		let mut mc = BigramChain::new();
		mc.add_sequence(words("x !")).unwrap();
		mc.add_sequence(words("! name")).unwrap();
		let pd = mc.successors("!").unwrap();
		assert_eq!(pd.index(&Token::End).unwrap(), 0);
		assert_eq!(pd.index(&Token::from("name")).unwrap(), 1);

		// "!" < "<END>" < "name"
		let mut mc = BigramChain::new();
		mc.add_sequence(["Hello", "!"]).unwrap();
		mc.add_sequence(["Hello"]).unwrap();
		mc.add_sequence(["Hello", "name"]).unwrap();
		let pd = mc.successors("Hello").unwrap();
		assert_eq!(
			pd.keys().cloned().collect::<Vec<_>>(),
			vec![Token::from("!"), Token::End, Token::from("name")]
		);
	}

	#[test]
	fn end_stays_distinct_from_its_label() {
		let word = Token::from(END_LABEL);
		assert_ne!(Token::End, word);
		assert_eq!(Token::End.cmp(&word), Ordering::Less);
		assert!(Token::from("1") < Token::End);
		assert!(Token::End < Token::from("a"));
	}

	#[test]
	fn find_walk_choices_ranks_end_after_symbols() {
		let mut mc = BigramChain::new();
		mc.add_sequence(["Hello", "!"]).unwrap();
		mc.add_sequence(["Hello"]).unwrap();

		assert_eq!(mc.find_walk_choices(&["Hello"]).unwrap(), vec![0, 1]);
		assert_eq!(mc.find_walk_choices(&["Hello", "!"]).unwrap(), vec![0, 0, 0]);
	}

	#[test]
	fn walk_on_untrained_chain_is_empty_and_consumes_nothing() {
		let mc = BigramChain::new();
		let mut source = ReplaySource::new([1, 2, 3]).unwrap();
		assert_eq!(mc.get_walk(&mut source).count(), 0);
		assert_eq!(source.position(), 0);
	}

	#[test]
	fn walk_is_fused_after_end() {
		let mut mc = BigramChain::new();
		mc.add_sequence(["only"]).unwrap();
		let mut source = ReplaySource::new([0]).unwrap();
		let mut walk = mc.get_walk(&mut source);
		assert_eq!(walk.next().unwrap().unwrap(), "only");
		assert!(walk.next().is_none());
		assert!(walk.next().is_none());
	}

	#[test]
	fn walk_reports_broken_chain() {
		let mut mc = BigramChain::new();
		mc.start_tokens.record("orphan".to_owned());
		let mut source = ReplaySource::new([0]).unwrap();
		let mut walk = mc.get_walk(&mut source);
		assert_eq!(walk.next().unwrap().unwrap(), "orphan");
		assert!(matches!(walk.next(), Some(Err(MarkovError::IllegalState(_)))));
		assert!(walk.next().is_none());
	}

	#[test]
	fn find_walk_choices_rejects_empty_and_unknown() {
		let mut mc = BigramChain::new();
		mc.add_sequence(words("a b")).unwrap();

		let empty: [&str; 0] = [];
		assert!(matches!(mc.find_walk_choices(&empty), Err(MarkovError::InvalidArgument(_))));
		assert!(matches!(mc.find_walk_choices(&["b"]), Err(MarkovError::InvalidArgument(_))));
		assert!(matches!(mc.find_walk_choices(&["a", "c"]), Err(MarkovError::InvalidArgument(_))));
		assert!(matches!(mc.find_walk_choices(&["a"]), Err(MarkovError::InvalidArgument(_))));
		assert_eq!(mc.find_walk_choices(&["a", "b"]).unwrap(), vec![0, 0, 0]);
	}

	#[test]
	fn display_dumps_every_distribution() {
		let mut mc = BigramChain::new();
		mc.add_sequence(words("a b")).unwrap();
		let dump = mc.to_string();
		assert!(dump.contains("start tokens: { \"a\":1 }"));
		assert!(dump.contains("\"b\": { \"<END>\":1 }"));
	}
}
