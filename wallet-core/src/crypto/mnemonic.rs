// wallet-core/src/crypto/mnemonic.rs
//
// Mnemonic Engine - BIP-39
// Entropy ↔ word sequence (11-bit groups + SHA256 checksum), seed derivation
// bằng PBKDF2-HMAC-SHA512 (2048 rounds, NFKD-normalized input).
//
// Wordlists lấy từ bip39 crate (feature `all-languages`); mapping giữa bits và
// từ được làm ở đây để kiểm soát chính xác các lỗi import.

use crate::crypto::hash::sha256;
use crate::error::{CryptoError, MnemonicError, WalletResult};
use pbkdf2::pbkdf2_hmac;
use rand::{rngs::OsRng, RngCore};
use sha2::Sha512;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

const SEED_ROUNDS: u32 = 2048;
const SEED_LEN: usize = 64;
const BITS_PER_WORD: usize = 11;
const MIN_WORDS: usize = 12;

/// Entropy size in bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntropySize {
    /// 12 words
    B128 = 128,
    /// 15 words
    B160 = 160,
    /// 18 words
    B192 = 192,
    /// 21 words
    B224 = 224,
    /// 24 words
    #[default]
    B256 = 256,
}

impl EntropySize {
    pub const ALL: [EntropySize; 5] = [
        EntropySize::B128,
        EntropySize::B160,
        EntropySize::B192,
        EntropySize::B224,
        EntropySize::B256,
    ];

    #[inline]
    pub const fn bits(self) -> usize {
        self as usize
    }

    #[inline]
    pub const fn bytes(self) -> usize {
        self.bits() / 8
    }

    #[inline]
    pub const fn word_count(self) -> usize {
        (self.bits() + self.bits() / 32) / BITS_PER_WORD
    }

    pub fn from_bits(bits: usize) -> Result<Self, MnemonicError> {
        Self::ALL
            .into_iter()
            .find(|size| size.bits() == bits)
            .ok_or(MnemonicError::InvalidEntropySize(bits))
    }
}

/// Wordlist language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MnemonicLanguage {
    #[default]
    English,
    ChineseSimplified,
    ChineseTraditional,
    Japanese,
    Korean,
    French,
    Italian,
    Spanish,
}

impl MnemonicLanguage {
    /// The 2048-word dictionary for this language.
    pub fn words(self) -> &'static [&'static str; 2048] {
        let language = match self {
            MnemonicLanguage::English => bip39::Language::English,
            MnemonicLanguage::ChineseSimplified => bip39::Language::SimplifiedChinese,
            MnemonicLanguage::ChineseTraditional => bip39::Language::TraditionalChinese,
            MnemonicLanguage::Japanese => bip39::Language::Japanese,
            MnemonicLanguage::Korean => bip39::Language::Korean,
            MnemonicLanguage::French => bip39::Language::French,
            MnemonicLanguage::Italian => bip39::Language::Italian,
            MnemonicLanguage::Spanish => bip39::Language::Spanish,
        };
        language.word_list()
    }

    /// Word separator: ideographic space cho tiếng Nhật, space cho các ngôn ngữ còn lại.
    #[inline]
    pub const fn separator(self) -> &'static str {
        match self {
            MnemonicLanguage::Japanese => "\u{3000}",
            _ => " ",
        }
    }

    /// Exact dictionary index, no case folding.
    fn index_of(self, word: &str) -> Option<usize> {
        self.words().iter().position(|candidate| *candidate == word)
    }
}

/// BIP-39 mnemonic.
///
/// Immutable after construction. `seed()` is a pure function of the phrase and
/// the optional password; the password does not take part in the checksum.
///
/// # Security
/// - Entropy, phrase và password bị ghi đè bằng 0 khi drop
/// - `Debug` không bao giờ in phrase
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Mnemonic {
    entropy: Vec<u8>,
    phrase: String,
    password: String,
    #[zeroize(skip)]
    language: MnemonicLanguage,
}

impl std::fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mnemonic")
            .field("language", &self.language)
            .field("word_count", &self.word_count())
            .field("phrase", &"[REDACTED]")
            .finish()
    }
}

impl PartialEq for Mnemonic {
    fn eq(&self, other: &Self) -> bool {
        self.entropy == other.entropy
            && self.language == other.language
            && self.password == other.password
    }
}

impl Eq for Mnemonic {}

impl Mnemonic {
    // =========================================================================
    // CONSTRUCTORS
    // =========================================================================

    /// Generate a fresh mnemonic from OS randomness.
    ///
    /// Randomness failure is propagated, never replaced by a weaker source.
    pub fn generate(size: EntropySize, language: MnemonicLanguage) -> WalletResult<Self> {
        let mut entropy = Zeroizing::new(vec![0u8; size.bytes()]);
        OsRng
            .try_fill_bytes(&mut entropy)
            .map_err(|e| CryptoError::RandomnessUnavailable(e.to_string()))?;
        Self::from_entropy(&entropy, language)
    }

    /// Build the mnemonic for caller-supplied entropy (16..=32 bytes, multiple of 4).
    pub fn from_entropy(entropy: &[u8], language: MnemonicLanguage) -> WalletResult<Self> {
        if entropy.len() < 16 || entropy.len() > 32 || entropy.len() % 4 != 0 {
            return Err(MnemonicError::InvalidEntropySize(entropy.len() * 8).into());
        }

        let checksum = sha256(entropy);
        let checksum_len = entropy.len() * 8 / 32;
        let mut bits = bytes_to_bits(entropy);
        bits.extend(bytes_to_bits(&checksum).into_iter().take(checksum_len));

        let words = language.words();
        let phrase = bits
            .chunks(BITS_PER_WORD)
            .map(|chunk| words[bits_to_index(chunk)])
            .collect::<Vec<_>>()
            .join(language.separator());
        bits.zeroize();

        Ok(Self {
            entropy: entropy.to_vec(),
            phrase,
            password: String::new(),
            language,
        })
    }

    /// Import a phrase, validating word count, dictionary membership and checksum.
    ///
    /// # Errors
    /// - `NotEnoughWords` khi ít hơn 12 từ
    /// - `InvalidWordCount` khi số từ không chia hết cho 3
    /// - `WordNotFound` cho từ đầu tiên không có trong wordlist
    /// - `InvalidBitLength` khi số bit không chia hết cho 33. Không thể xảy ra
    ///   sau khi đã kiểm tra bội số của 3 (3k từ × 11 = 33k bit); chỉ giữ làm guard
    /// - `ChecksumMismatch { computed, expected }` khi checksum sai
    pub fn from_phrase(phrase: &str, language: MnemonicLanguage) -> WalletResult<Self> {
        // split_whitespace cũng tách theo U+3000 (ideographic space)
        let words: Vec<&str> = phrase.split_whitespace().collect();
        if words.len() < MIN_WORDS {
            return Err(MnemonicError::NotEnoughWords(words.len()).into());
        }
        if words.len() % 3 != 0 {
            return Err(MnemonicError::InvalidWordCount(words.len()).into());
        }

        let mut bits = Vec::with_capacity(words.len() * BITS_PER_WORD);
        for word in &words {
            let index = language
                .index_of(word)
                .ok_or_else(|| MnemonicError::WordNotFound((*word).to_string()))?;
            bits.extend((0..BITS_PER_WORD).rev().map(|shift| (index >> shift) & 1 == 1));
        }
        // luôn đúng khi số từ chia hết cho 3
        if bits.len() % 33 != 0 {
            return Err(MnemonicError::InvalidBitLength(bits.len()).into());
        }

        let checksum_len = bits.len() / 33;
        let (entropy_bits, checksum_bits) = bits.split_at(bits.len() - checksum_len);
        let entropy = bits_to_bytes(entropy_bits);

        let computed: String = bytes_to_bits(&sha256(&entropy))
            .into_iter()
            .take(checksum_len)
            .map(bit_char)
            .collect();
        let expected: String = checksum_bits.iter().copied().map(bit_char).collect();
        bits.zeroize();
        if computed != expected {
            return Err(MnemonicError::ChecksumMismatch { computed, expected }.into());
        }

        Ok(Self {
            entropy,
            phrase: words.join(language.separator()),
            password: String::new(),
            language,
        })
    }

    /// Same mnemonic, different seed password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password.zeroize();
        self.password = password.into();
        self
    }

    // =========================================================================
    // GETTERS
    // =========================================================================

    /// The rendered word sequence.
    ///
    /// # Warning
    /// Cẩn thận khi hiển thị hoặc log giá trị này!
    #[inline]
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    #[inline]
    pub fn entropy(&self) -> &[u8] {
        &self.entropy
    }

    #[inline]
    pub fn language(&self) -> MnemonicLanguage {
        self.language
    }

    pub fn words(&self) -> Vec<&str> {
        self.phrase.split_whitespace().collect()
    }

    pub fn word_count(&self) -> usize {
        self.phrase.split_whitespace().count()
    }

    // =========================================================================
    // SEED DERIVATION
    // =========================================================================

    /// 64-byte BIP-39 seed for this phrase and password.
    pub fn seed(&self) -> Zeroizing<[u8; SEED_LEN]> {
        Self::seed_from_phrase(&self.phrase, &self.password)
    }

    /// PBKDF2-HMAC-SHA512(NFKD(phrase), "mnemonic" + NFKD(password)).
    ///
    /// Ignores the dictionary entirely: any string yields a seed.
    pub fn seed_from_phrase(phrase: &str, password: &str) -> Zeroizing<[u8; SEED_LEN]> {
        let normalized: Zeroizing<String> = Zeroizing::new(phrase.nfkd().collect());
        let salt: Zeroizing<String> =
            Zeroizing::new(format!("mnemonic{}", password).nfkd().collect());

        let mut seed = Zeroizing::new([0u8; SEED_LEN]);
        pbkdf2_hmac::<Sha512>(
            normalized.as_bytes(),
            salt.as_bytes(),
            SEED_ROUNDS,
            &mut seed[..],
        );
        seed
    }
}

impl std::fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.phrase)
    }
}

// =============================================================================
// BIT HELPERS
// =============================================================================

fn bytes_to_bits(bytes: &[u8]) -> Vec<bool> {
    bytes
        .iter()
        .flat_map(|byte| (0..8).rev().map(move |shift| (byte >> shift) & 1 == 1))
        .collect()
}

fn bits_to_bytes(bits: &[bool]) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| chunk.iter().fold(0u8, |acc, bit| (acc << 1) | u8::from(*bit)))
        .collect()
}

fn bits_to_index(bits: &[bool]) -> usize {
    bits.iter().fold(0usize, |acc, bit| (acc << 1) | usize::from(*bit))
}

#[inline]
fn bit_char(bit: bool) -> char {
    if bit {
        '1'
    } else {
        '0'
    }
}

// =============================================================================
// UNIT TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WalletError;

    // Standard test mnemonic (from BIP-39 test vectors)
    const TEST_MNEMONIC_12: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
    const TEST_MNEMONIC_24: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon art";

    #[test]
    fn test_entropy_size_word_counts() {
        let counts: Vec<usize> = EntropySize::ALL.iter().map(|s| s.word_count()).collect();
        assert_eq!(counts, vec![12, 15, 18, 21, 24]);
        assert_eq!(EntropySize::from_bits(192).unwrap(), EntropySize::B192);
        assert_eq!(
            EntropySize::from_bits(100),
            Err(MnemonicError::InvalidEntropySize(100))
        );
    }

    #[test]
    fn test_generate_roundtrip_all_sizes() {
        for size in EntropySize::ALL {
            let generated = Mnemonic::generate(size, MnemonicLanguage::English).unwrap();
            assert_eq!(generated.entropy().len(), size.bytes());
            assert_eq!(generated.word_count(), size.word_count());

            let imported =
                Mnemonic::from_phrase(generated.phrase(), MnemonicLanguage::English).unwrap();
            assert_eq!(imported, generated);
        }
    }

    #[test]
    fn test_unique_generation() {
        let m1 = Mnemonic::generate(EntropySize::B128, MnemonicLanguage::English).unwrap();
        let m2 = Mnemonic::generate(EntropySize::B128, MnemonicLanguage::English).unwrap();
        assert_ne!(m1.phrase(), m2.phrase());
    }

    #[test]
    fn test_zero_entropy_vectors() {
        let m12 = Mnemonic::from_entropy(&[0u8; 16], MnemonicLanguage::English).unwrap();
        assert_eq!(m12.phrase(), TEST_MNEMONIC_12);
        let m24 = Mnemonic::from_entropy(&[0u8; 32], MnemonicLanguage::English).unwrap();
        assert_eq!(m24.phrase(), TEST_MNEMONIC_24);
    }

    #[test]
    fn test_from_entropy_matches_bip39_crate() {
        let entropy: Vec<u8> = (0u8..16).collect();
        let ours = Mnemonic::from_entropy(&entropy, MnemonicLanguage::English).unwrap();
        let reference = bip39::Mnemonic::from_entropy(&entropy).unwrap();
        assert_eq!(ours.phrase(), reference.to_string());
        assert_eq!(&ours.seed()[..], &reference.to_seed("")[..]);
    }

    #[test]
    fn test_from_entropy_invalid_size() {
        for len in [0usize, 12, 15, 17, 36] {
            let result = Mnemonic::from_entropy(&vec![0u8; len], MnemonicLanguage::English);
            assert_eq!(
                result,
                Err(WalletError::Mnemonic(MnemonicError::InvalidEntropySize(len * 8)))
            );
        }
    }

    #[test]
    fn test_seed_vector_with_trezor_password() {
        // BIP-39 official vector: entropy 00..00, passphrase "TREZOR"
        let mnemonic = Mnemonic::from_phrase(TEST_MNEMONIC_12, MnemonicLanguage::English)
            .unwrap()
            .with_password("TREZOR");
        assert_eq!(
            hex::encode(&mnemonic.seed()[..]),
            "c55257c360c07c72029aebc1b53c05ed0362ada38ead3e3e9efa3708e53495531f09a6987599d18264c1e1c92f2cf141630c7a3c4ab7c81b2f001698e7463b04"
        );
    }

    #[test]
    fn test_seed_from_phrase_ignores_dictionary() {
        let seed = Mnemonic::seed_from_phrase("not a real mnemonic", "");
        assert_eq!(seed.len(), 64);
        assert_ne!(&seed[..], &[0u8; 64][..]);
    }

    #[test]
    fn test_password_changes_seed_not_phrase() {
        let plain = Mnemonic::from_phrase(TEST_MNEMONIC_12, MnemonicLanguage::English).unwrap();
        let with_pass = plain.clone().with_password("secret");
        assert_eq!(plain.phrase(), with_pass.phrase());
        assert_eq!(plain.entropy(), with_pass.entropy());
        assert_ne!(&plain.seed()[..], &with_pass.seed()[..]);
    }

    #[test]
    fn test_from_phrase_not_enough_words() {
        let result = Mnemonic::from_phrase("abandon abandon abandon", MnemonicLanguage::English);
        assert!(matches!(
            result,
            Err(WalletError::Mnemonic(MnemonicError::NotEnoughWords(3)))
        ));
    }

    #[test]
    fn test_from_phrase_invalid_word_count() {
        let phrase = [TEST_MNEMONIC_12, "abandon"].join(" ");
        let result = Mnemonic::from_phrase(&phrase, MnemonicLanguage::English);
        assert!(matches!(
            result,
            Err(WalletError::Mnemonic(MnemonicError::InvalidWordCount(13)))
        ));

        // 14 × 11 = 154 bit, nhưng word count bị chặn trước bit length
        let phrase = [TEST_MNEMONIC_12, "abandon abandon"].join(" ");
        assert!(matches!(
            Mnemonic::from_phrase(&phrase, MnemonicLanguage::English),
            Err(WalletError::Mnemonic(MnemonicError::InvalidWordCount(14)))
        ));
    }

    #[test]
    fn test_from_phrase_word_not_found() {
        let invalid = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon invalid";
        let result = Mnemonic::from_phrase(invalid, MnemonicLanguage::English);
        assert_eq!(
            result,
            Err(WalletError::Mnemonic(MnemonicError::WordNotFound("invalid".into())))
        );
    }

    #[test]
    fn test_from_phrase_no_case_folding() {
        let upper = TEST_MNEMONIC_12.replacen("abandon", "Abandon", 1);
        assert!(matches!(
            Mnemonic::from_phrase(&upper, MnemonicLanguage::English),
            Err(WalletError::Mnemonic(MnemonicError::WordNotFound(_)))
        ));
    }

    #[test]
    fn test_from_phrase_checksum_mismatch() {
        // "abandon" x12: entropy 0, checksum bits 0000 nhưng từ cuối mang 0000 ≠ 0011
        let bad = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon";
        let result = Mnemonic::from_phrase(bad, MnemonicLanguage::English);
        assert_eq!(
            result,
            Err(WalletError::Mnemonic(MnemonicError::ChecksumMismatch {
                computed: "0011".into(),
                expected: "0000".into(),
            }))
        );
    }

    #[test]
    fn test_japanese_separator() {
        let mnemonic = Mnemonic::from_entropy(&[0u8; 16], MnemonicLanguage::Japanese).unwrap();
        assert!(mnemonic.phrase().contains('\u{3000}'));
        assert!(!mnemonic.phrase().contains(' '));
        assert_eq!(mnemonic.word_count(), 12);

        let imported =
            Mnemonic::from_phrase(mnemonic.phrase(), MnemonicLanguage::Japanese).unwrap();
        assert_eq!(imported.entropy(), &[0u8; 16]);
    }

    #[test]
    fn test_all_languages_roundtrip() {
        let entropy = [0x7fu8; 20];
        for language in [
            MnemonicLanguage::English,
            MnemonicLanguage::ChineseSimplified,
            MnemonicLanguage::ChineseTraditional,
            MnemonicLanguage::Japanese,
            MnemonicLanguage::Korean,
            MnemonicLanguage::French,
            MnemonicLanguage::Italian,
            MnemonicLanguage::Spanish,
        ] {
            let mnemonic = Mnemonic::from_entropy(&entropy, language).unwrap();
            assert_eq!(mnemonic.word_count(), 15);
            let imported = Mnemonic::from_phrase(mnemonic.phrase(), language).unwrap();
            assert_eq!(imported.entropy(), &entropy);
        }
    }

    #[test]
    fn test_debug_does_not_leak_phrase() {
        let mnemonic = Mnemonic::from_phrase(TEST_MNEMONIC_12, MnemonicLanguage::English).unwrap();
        let debug_output = format!("{:?}", mnemonic);

        // Đảm bảo phrase KHÔNG xuất hiện trong debug output
        assert!(!debug_output.contains("abandon"));
        assert!(debug_output.contains("REDACTED"));
        assert!(debug_output.contains("word_count: 12"));
    }
}
