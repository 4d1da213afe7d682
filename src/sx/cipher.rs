use crate::sx::key::SxKey;

// Multipliers of the keystream generator. All cipher arithmetic is
// wrapping u32/u16; every multiply and add below must wrap.
const RND_MUL1: u32 = 0xDE6D;
const RND_MUL2: u32 = 0x278D;

// Keystream state: a 32-bit seed plus the 16-bit round key consumed by the
// per-byte transform. One state transforms one contiguous byte stream in
// order; it is never shared between streams.
#[derive(Debug, Clone, Copy)]
struct Seed {
    seed: u32,
    round_key: u16,
}

impl Seed {
    // Mixes the key into the initial seed. Seven iterations, one per u16
    // window at key indices 0..=6; the window at index 6 covers the last
    // two key bytes. The two halves of the seed are disjoint under the
    // rotate, so the reference's `(seed >> 16) + (seed << 16)` is exactly
    // a 32-bit rotate by 16.
    fn init(key: &SxKey) -> Self {
        let mut seed: u32 = 0;
        for i in 0..7 {
            seed = seed
                .rotate_left(16)
                .wrapping_mul(17)
                .wrapping_add(u32::from(key.le_u16_at(i)));
        }
        seed |= 1;
        let round_key = seed as u16;

        Seed {
            seed: seed.rotate_left(16),
            round_key,
        }
    }

    // One keystream step. `key_idx` cycles 0..=6; the u16 read at index 6
    // spans key bytes 6 and 7 and never wraps around. The round key update
    // is a wrapping 16-bit add of the key window onto `new_hi | 1`.
    fn next(&mut self, key: &SxKey, key_idx: usize) {
        let lo = self.seed & 0xFFFF;
        let hi = self.seed >> 16;

        let t1 = RND_MUL1.wrapping_mul(lo);
        let t2 = RND_MUL2.wrapping_mul(lo).wrapping_add(t1 >> 16);
        let new_lo = t1 & 0xFFFF;
        let t1 = RND_MUL1.wrapping_mul(hi);
        let new_hi = t1.wrapping_add(t2) & 0xFFFF;

        self.seed = (new_hi << 16) | new_lo;
        self.round_key = ((new_hi as u16) | 1).wrapping_add(key.le_u16_at(key_idx));
    }
}

// The 8-bit rotations run in u32 so that a shift of 8 (when the round key's
// low three bits are zero) stays defined and degenerates to identity.
fn encrypt_byte(byte: u8, round_key: u16) -> u8 {
    let shift = u32::from(round_key) & 0x07;
    let b = u32::from(byte);
    let rotated = ((b >> shift) | (b << (8 - shift))) & 0xFF;
    (rotated.wrapping_add(u32::from(round_key)) & 0xFF) as u8
}

fn decrypt_byte(byte: u8, round_key: u16) -> u8 {
    let shift = u32::from(round_key) & 0x07;
    let pre = u32::from(byte).wrapping_sub(u32::from(round_key)) & 0xFF;
    (((pre << shift) | (pre >> (8 - shift))) & 0xFF) as u8
}

/// The SIX stream cipher, output-compatible with Harbour's
/// `hb_sxEnCrypt`/`hb_sxDeCrypt`.
///
/// There is no envelope, padding or alignment: ciphertext length always
/// equals plaintext length, and `decrypt(encrypt(b)) == b` for every key.
/// The cipher has no failure mode; an empty input produces empty output.
#[derive(Debug, Clone, Copy)]
pub struct SxCipher {
    key: SxKey,
}

impl SxCipher {
    pub fn new(key: SxKey) -> Self {
        SxCipher { key }
    }

    pub fn encrypt(&self, src: &[u8]) -> Vec<u8> {
        let mut out = src.to_vec();
        self.encrypt_in_place(&mut out);
        out
    }

    pub fn decrypt(&self, src: &[u8]) -> Vec<u8> {
        let mut out = src.to_vec();
        self.decrypt_in_place(&mut out);
        out
    }

    pub fn encrypt_in_place(&self, buffer: &mut [u8]) {
        SxEncryptStream::new(self.key).process(buffer);
    }

    pub fn decrypt_in_place(&self, buffer: &mut [u8]) {
        SxDecryptStream::new(self.key).process(buffer);
    }
}

/// Incremental encryptor for chunked processing of large payloads.
///
/// The keystream state flows unbroken across `process` calls, so splitting
/// an input at arbitrary chunk boundaries yields the same bytes as a single
/// [`SxCipher::encrypt`] over the whole input.
#[derive(Debug)]
pub struct SxEncryptStream {
    key: SxKey,
    seed: Seed,
    key_idx: usize,
}

impl SxEncryptStream {
    pub fn new(key: SxKey) -> Self {
        SxEncryptStream {
            key,
            seed: Seed::init(&key),
            key_idx: 0,
        }
    }

    pub fn process(&mut self, chunk: &mut [u8]) {
        for byte in chunk.iter_mut() {
            *byte = encrypt_byte(*byte, self.seed.round_key);
            self.seed.next(&self.key, self.key_idx);
            self.key_idx = (self.key_idx + 1) % 7;
        }
    }
}

/// Incremental decryptor, the inverse of [`SxEncryptStream`].
#[derive(Debug)]
pub struct SxDecryptStream {
    key: SxKey,
    seed: Seed,
    key_idx: usize,
}

impl SxDecryptStream {
    pub fn new(key: SxKey) -> Self {
        SxDecryptStream {
            key,
            seed: Seed::init(&key),
            key_idx: 0,
        }
    }

    pub fn process(&mut self, chunk: &mut [u8]) {
        for byte in chunk.iter_mut() {
            *byte = decrypt_byte(*byte, self.seed.round_key);
            self.seed.next(&self.key, self.key_idx);
            self.key_idx = (self.key_idx + 1) % 7;
        }
    }
}
