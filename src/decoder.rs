use std::io::Read;

#[cfg(feature = "bzip2")]
use bzip2::read::BzDecoder;
#[cfg(feature = "deflate")]
use flate2::bufread::DeflateDecoder;
use lzma_rust2::{
    LZMA2Reader, LZMAReader,
    filter::{bcj::BCJReader, delta::DeltaReader},
};
#[cfg(feature = "ppmd")]
use ppmd_rust::{PPMD7_MAX_MEM_SIZE, PPMD7_MAX_ORDER, PPMD7_MIN_MEM_SIZE, PPMD7_MIN_ORDER, Ppmd7Decoder};

use crate::{archive::EncoderMethod, block::Coder, error::Error};

/// A decoding reader for a single coder in a block's coder chain.
#[allow(clippy::upper_case_acronyms)]
pub(crate) enum Decoder<R: Read> {
    COPY(R),
    LZMA(Box<LZMAReader<R>>),
    LZMA2(Box<LZMA2Reader<R>>),
    #[cfg(feature = "ppmd")]
    PPMD(Box<Ppmd7Decoder<R>>),
    BCJ(BCJReader<R>),
    Delta(DeltaReader<R>),
    #[cfg(feature = "bzip2")]
    BZip2(BzDecoder<R>),
    #[cfg(feature = "deflate")]
    Deflate(DeflateDecoder<std::io::BufReader<R>>),
    #[cfg(feature = "zstd")]
    ZSTD(zstd::Decoder<'static, std::io::BufReader<R>>),
}

impl<R: Read> Read for Decoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Decoder::COPY(r) => r.read(buf),
            Decoder::LZMA(r) => r.read(buf),
            Decoder::LZMA2(r) => r.read(buf),
            #[cfg(feature = "ppmd")]
            Decoder::PPMD(r) => r.read(buf),
            Decoder::BCJ(r) => r.read(buf),
            Decoder::Delta(r) => r.read(buf),
            #[cfg(feature = "bzip2")]
            Decoder::BZip2(r) => r.read(buf),
            #[cfg(feature = "deflate")]
            Decoder::Deflate(r) => r.read(buf),
            #[cfg(feature = "zstd")]
            Decoder::ZSTD(r) => r.read(buf),
        }
    }
}

/// Wraps `input` with the decoder for `coder`'s method, sized for `uncompressed_len` output
/// bytes and bounded to `max_mem_limit_kb` of working memory.
pub(crate) fn add_decoder<I: Read>(
    input: I,
    uncompressed_len: usize,
    coder: &Coder,
    max_mem_limit_kb: usize,
) -> Result<Decoder<I>, Error> {
    let method = EncoderMethod::by_id(coder.encoder_method_id())
        .ok_or_else(|| Error::UnsupportedMethod(format!("{:?}", coder.encoder_method_id())))?;
    match method.id() {
        EncoderMethod::ID_COPY => Ok(Decoder::COPY(input)),
        EncoderMethod::ID_LZMA => {
            let dict_size = get_lzma_dic_size(coder)?;
            if coder.properties.is_empty() {
                return Err(Error::bad_header("LZMA properties too short"));
            }
            let props = coder.properties[0];
            let lz = LZMAReader::new_with_props(input, uncompressed_len as _, props, dict_size, None)
                .map_err(Error::io)?;
            Ok(Decoder::LZMA(Box::new(lz)))
        }
        EncoderMethod::ID_LZMA2 => {
            let dic_size = get_lzma2_dic_size(coder)?;
            let mem_size = (dic_size as usize) / 1024;
            if mem_size > max_mem_limit_kb {
                return Err(Error::MaxMemLimited {
                    max_kb: max_mem_limit_kb,
                    actual_kb: mem_size,
                });
            }
            Ok(Decoder::LZMA2(Box::new(LZMA2Reader::new(input, dic_size, None))))
        }
        #[cfg(feature = "ppmd")]
        EncoderMethod::ID_PPMD => {
            let (order, memory_size) = get_ppmd_order_memory_size(coder, max_mem_limit_kb)?;
            let ppmd =
                Ppmd7Decoder::new(input, order, memory_size).map_err(|err| Error::other(err.to_string()))?;
            Ok(Decoder::PPMD(Box::new(ppmd)))
        }
        #[cfg(feature = "bzip2")]
        EncoderMethod::ID_BZIP2 => Ok(Decoder::BZip2(BzDecoder::new(input))),
        #[cfg(feature = "deflate")]
        EncoderMethod::ID_DEFLATE => {
            let buf_read = std::io::BufReader::new(input);
            Ok(Decoder::Deflate(DeflateDecoder::new(buf_read)))
        }
        #[cfg(feature = "zstd")]
        EncoderMethod::ID_ZSTD => Ok(Decoder::ZSTD(zstd::Decoder::new(input).map_err(Error::io)?)),
        EncoderMethod::ID_BCJ_X86 => Ok(Decoder::BCJ(BCJReader::new_x86(input, 0))),
        EncoderMethod::ID_BCJ_ARM => Ok(Decoder::BCJ(BCJReader::new_arm(input, 0))),
        EncoderMethod::ID_BCJ_ARM64 => Ok(Decoder::BCJ(BCJReader::new_arm64(input, 0))),
        EncoderMethod::ID_BCJ_ARM_THUMB => Ok(Decoder::BCJ(BCJReader::new_arm_thumb(input, 0))),
        EncoderMethod::ID_BCJ_PPC => Ok(Decoder::BCJ(BCJReader::new_ppc(input, 0))),
        EncoderMethod::ID_BCJ_IA64 => Ok(Decoder::BCJ(BCJReader::new_ia64(input, 0))),
        EncoderMethod::ID_BCJ_SPARC => Ok(Decoder::BCJ(BCJReader::new_sparc(input, 0))),
        EncoderMethod::ID_DELTA => {
            let d = if coder.properties.is_empty() {
                1
            } else {
                coder.properties[0].wrapping_add(1)
            };
            Ok(Decoder::Delta(DeltaReader::new(input, d as usize)))
        }
        EncoderMethod::ID_BCJ2 => Err(Error::unsupported_feature("BCJ2 multi-input filter")),
        _ => Err(Error::UnsupportedMethod(method.name().to_string())),
    }
}

#[cfg(feature = "ppmd")]
fn get_ppmd_order_memory_size(coder: &Coder, max_mem_limit_kb: usize) -> Result<(u32, u32), Error> {
    if coder.properties.len() < 5 {
        return Err(Error::bad_header("PPMD properties too short"));
    }
    let order = coder.properties[0] as u32;
    let memory_size = u32::from_le_bytes([
        coder.properties[1],
        coder.properties[2],
        coder.properties[3],
        coder.properties[4],
    ]);

    if order < PPMD7_MIN_ORDER {
        return Err(Error::bad_header("PPMD order smaller than PPMD7_MIN_ORDER"));
    }
    if order > PPMD7_MAX_ORDER {
        return Err(Error::bad_header("PPMD order larger than PPMD7_MAX_ORDER"));
    }
    if memory_size < PPMD7_MIN_MEM_SIZE {
        return Err(Error::bad_header("PPMD memory size smaller than PPMD7_MIN_MEM_SIZE"));
    }
    if memory_size > PPMD7_MAX_MEM_SIZE {
        return Err(Error::bad_header("PPMD memory size larger than PPMD7_MAX_MEM_SIZE"));
    }
    if memory_size as usize > max_mem_limit_kb {
        return Err(Error::MaxMemLimited {
            max_kb: max_mem_limit_kb,
            actual_kb: memory_size as usize,
        });
    }

    Ok((order, memory_size))
}

fn get_lzma2_dic_size(coder: &Coder) -> Result<u32, Error> {
    if coder.properties.is_empty() {
        return Err(Error::bad_header("LZMA2 properties too short"));
    }
    let dict_size_bits = 0xFF & coder.properties[0] as u32;
    if (dict_size_bits & (!0x3F)) != 0 {
        return Err(Error::bad_header("unsupported LZMA2 property bits"));
    }
    if dict_size_bits > 40 {
        return Err(Error::bad_header("dictionary larger than 4GiB maximum size"));
    }
    if dict_size_bits == 40 {
        return Ok(0xFFFFFFFF);
    }
    let size = (2 | (dict_size_bits & 0x1)) << (dict_size_bits / 2 + 11);
    Ok(size)
}

fn get_lzma_dic_size(coder: &Coder) -> Result<u32, Error> {
    if coder.properties.len() < 5 {
        return Err(Error::bad_header("LZMA properties too short"));
    }
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&coder.properties[1..5]);
    Ok(u32::from_le_bytes(buf))
}
