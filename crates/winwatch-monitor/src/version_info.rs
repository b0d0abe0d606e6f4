//! 실행 파일 버전 리소스(`VS_VERSIONINFO`) 파서.
//!
//! `GetFileVersionInfoW`가 돌려준 원시 블록을 순수 Rust로 해석한다.
//! 블록은 다음 형태의 노드 트리다:
//!
//! ```text
//! wLength(u16) wValueLength(u16) wType(u16) szKey(UTF-16, NUL 종료)
//! <4바이트 정렬 패딩> Value <4바이트 정렬 패딩> Children...
//! ```
//!
//! `wType == 1`이면 값이 텍스트이고 `wValueLength`는 UTF-16 코드 유닛 수,
//! 그 외에는 바이트 수다. 모든 오프셋/길이는 [`ByteReader`]가 블록 크기와
//! 대조한 뒤에만 슬라이스한다.

use std::fmt;
use thiserror::Error;
use winwatch_core::error::CoreError;

/// 노드 헤더 크기 (wLength + wValueLength + wType)
const HEADER_LEN: usize = 6;

/// 텍스트 값 노드의 wType
const TYPE_TEXT: u16 = 1;

/// 버전 리소스 파싱 에러
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionInfoError {
    /// 실행 파일에 버전 리소스가 없음
    #[error("버전 리소스 없음: {0}")]
    Missing(String),

    /// 블록 범위를 벗어난 오프셋/길이
    #[error("범위 초과: offset={offset}, len={len}, size={size}")]
    OutOfBounds {
        offset: usize,
        len: usize,
        size: usize,
    },

    /// 노드 구조 손상
    #[error("잘못된 노드 (offset={offset}): {reason}")]
    MalformedNode { offset: usize, reason: String },

    /// 번역 테이블 길이가 4의 배수가 아님
    #[error("번역 테이블 길이 오류: {0}바이트 (4의 배수여야 함)")]
    MalformedTranslation(usize),

    /// 번역 테이블이 비어 있음
    #[error("번역 테이블 비어 있음")]
    NoTranslation,

    /// 하위 블록 경로를 찾지 못함
    #[error("키 없음: {0}")]
    KeyNotFound(String),
}

impl VersionInfoError {
    /// 실행 파일 경로를 붙여 코어 에러로 변환
    pub fn into_core(self, path: &str) -> CoreError {
        CoreError::DescriptionUnavailable {
            path: path.to_string(),
            reason: self.to_string(),
        }
    }
}

/// 범위 검사를 거치는 리틀 엔디안 바이트 리더
#[derive(Debug, Clone, Copy)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// `[offset, offset + len)` 구간을 검사 후 반환
    pub fn slice(&self, offset: usize, len: usize) -> Result<&'a [u8], VersionInfoError> {
        let out_of_bounds = || VersionInfoError::OutOfBounds {
            offset,
            len,
            size: self.buf.len(),
        };
        let end = offset.checked_add(len).ok_or_else(out_of_bounds)?;
        self.buf.get(offset..end).ok_or_else(out_of_bounds)
    }

    pub fn u16_le(&self, offset: usize) -> Result<u16, VersionInfoError> {
        let bytes = self.slice(offset, 2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// `offset`부터 `limit` 전까지 NUL 종료 UTF-16 문자열 읽기
    ///
    /// 반환값: (문자열, NUL 다음 바이트 오프셋)
    fn utf16z(&self, offset: usize, limit: usize) -> Result<(String, usize), VersionInfoError> {
        let mut units = Vec::new();
        let mut pos = offset;
        loop {
            if pos + 2 > limit {
                return Err(VersionInfoError::MalformedNode {
                    offset,
                    reason: "키 문자열이 NUL로 끝나지 않음".to_string(),
                });
            }
            let unit = self.u16_le(pos)?;
            pos += 2;
            if unit == 0 {
                break;
            }
            units.push(unit);
        }
        Ok((String::from_utf16_lossy(&units), pos))
    }
}

/// 4바이트 경계로 올림
fn align4(offset: usize) -> usize {
    (offset + 3) & !3
}

/// UTF-16LE 바이트열을 첫 NUL 전까지 디코딩
pub fn decode_utf16z(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|&unit| unit != 0)
        .collect();
    String::from_utf16_lossy(&units)
}

/// 버전 리소스 노드 하나
#[derive(Debug, Clone)]
pub struct Node<'a> {
    /// 노드 키 (예: "StringFileInfo", "040904b0", "FileDescription")
    pub key: String,
    /// 0: 바이너리, 1: 텍스트
    pub value_type: u16,
    /// 값 원시 바이트
    pub value: &'a [u8],
    children_start: usize,
    end: usize,
}

impl Node<'_> {
    /// 텍스트 값이면 디코딩된 문자열
    pub fn text(&self) -> Option<String> {
        (self.value_type == TYPE_TEXT).then(|| decode_utf16z(self.value))
    }
}

/// 언어 ID + 코드 페이지 쌍
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Translation {
    pub language: u16,
    pub code_page: u16,
}

impl Translation {
    /// 4바이트 항목 해석: 두 개의 리틀 엔디안 u16 (언어, 코드 페이지)
    fn from_entry(entry: &[u8]) -> Self {
        Self {
            language: u16::from_le_bytes([entry[0], entry[1]]),
            code_page: u16::from_le_bytes([entry[2], entry[3]]),
        }
    }
}

/// `StringFileInfo` 하위 테이블 키 형식 (예: "040904b0")
impl fmt::Display for Translation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}{:04x}", self.language, self.code_page)
    }
}

/// 파싱된 버전 리소스 블록
#[derive(Debug, Clone, Copy)]
pub struct VersionInfo<'a> {
    reader: ByteReader<'a>,
}

impl<'a> VersionInfo<'a> {
    /// 루트 노드를 검증하고 블록을 감싼다
    pub fn parse(block: &'a [u8]) -> Result<Self, VersionInfoError> {
        let info = Self {
            reader: ByteReader::new(block),
        };
        info.node_at(0)?;
        Ok(info)
    }

    /// `offset`의 노드 헤더/키/값 해석
    fn node_at(&self, offset: usize) -> Result<Node<'a>, VersionInfoError> {
        let length = self.reader.u16_le(offset)? as usize;
        if length < HEADER_LEN {
            return Err(VersionInfoError::MalformedNode {
                offset,
                reason: format!("wLength={length}이 헤더보다 작음"),
            });
        }
        // 노드 전체가 블록 안에 있어야 한다
        self.reader.slice(offset, length)?;
        let end = offset + length;

        let value_len = self.reader.u16_le(offset + 2)? as usize;
        let value_type = self.reader.u16_le(offset + 4)?;
        let (key, key_end) = self.reader.utf16z(offset + HEADER_LEN, end)?;

        let value_start = align4(key_end);
        let value_bytes = if value_type == TYPE_TEXT {
            value_len * 2
        } else {
            value_len
        };
        let value = if value_bytes == 0 {
            &[][..]
        } else if value_start > end {
            return Err(VersionInfoError::OutOfBounds {
                offset: value_start,
                len: value_bytes,
                size: end,
            });
        } else if value_type == TYPE_TEXT {
            // 텍스트 길이를 바이트 수로 기록하는 링커가 있어 노드 끝에서 자른다.
            // 디코딩은 첫 NUL에서 멈춘다.
            self.reader
                .slice(value_start, value_bytes.min(end - value_start))?
        } else {
            if value_start + value_bytes > end {
                return Err(VersionInfoError::OutOfBounds {
                    offset: value_start,
                    len: value_bytes,
                    size: end,
                });
            }
            self.reader.slice(value_start, value_bytes)?
        };

        Ok(Node {
            key,
            value_type,
            value,
            children_start: align4(value_start + value.len()),
            end,
        })
    }

    /// 노드의 직계 자식 목록
    fn children(&self, parent: &Node<'a>) -> Result<Vec<Node<'a>>, VersionInfoError> {
        let mut children = Vec::new();
        let mut offset = parent.children_start;
        while offset + HEADER_LEN <= parent.end {
            // 일부 링커는 자식 뒤에 0 패딩을 남긴다
            if self.reader.u16_le(offset)? == 0 {
                break;
            }
            let child = self.node_at(offset)?;
            if child.end > parent.end {
                return Err(VersionInfoError::OutOfBounds {
                    offset,
                    len: child.end - offset,
                    size: parent.end,
                });
            }
            offset = align4(child.end);
            children.push(child);
        }
        Ok(children)
    }

    /// `\StringFileInfo\040904b0\FileDescription` 형식의 하위 블록 조회
    ///
    /// 키 비교는 대소문자를 구분하지 않는다. `\`는 루트 노드.
    pub fn query(&self, sub_block: &str) -> Result<Node<'a>, VersionInfoError> {
        let mut node = self.node_at(0)?;
        for segment in sub_block.split('\\').filter(|s| !s.is_empty()) {
            node = self
                .children(&node)?
                .into_iter()
                .find(|child| child.key.eq_ignore_ascii_case(segment))
                .ok_or_else(|| VersionInfoError::KeyNotFound(sub_block.to_string()))?;
        }
        Ok(node)
    }

    /// `\VarFileInfo\Translation` 번역 테이블
    pub fn translations(&self) -> Result<Vec<Translation>, VersionInfoError> {
        let node = self.query(r"\VarFileInfo\Translation")?;
        let data = node.value;
        // 항목 하나 = 16비트 언어 ID + 16비트 코드 페이지
        if data.len() % 4 != 0 {
            return Err(VersionInfoError::MalformedTranslation(data.len()));
        }
        Ok(data.chunks_exact(4).map(Translation::from_entry).collect())
    }

    /// `\StringFileInfo\<translation>\<item>` 문자열 값
    pub fn query_string(
        &self,
        translation: Translation,
        item: &str,
    ) -> Result<String, VersionInfoError> {
        let sub_block = format!(r"\StringFileInfo\{translation}\{item}");
        let node = self.query(&sub_block)?;
        Ok(node.text().unwrap_or_else(|| decode_utf16z(node.value)))
    }

    /// 첫 번째 번역의 FileDescription
    pub fn file_description(&self) -> Result<String, VersionInfoError> {
        let translation = self
            .translations()?
            .into_iter()
            .next()
            .ok_or(VersionInfoError::NoTranslation)?;
        self.query_string(translation, "FileDescription")
    }
}

/// 원시 버전 리소스 블록에서 FileDescription 추출
pub fn describe(block: &[u8]) -> Result<String, VersionInfoError> {
    VersionInfo::parse(block)?.file_description()
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn reads_file_description_for_first_translation() {
        let block = version_block(
            &translation_bytes(&[(0x0409, 0x04b0)]),
            "040904b0",
            "Foo Editor",
        );
        assert_eq!(describe(&block).unwrap(), "Foo Editor");
    }

    #[test]
    fn translation_key_is_language_then_code_page() {
        let block = version_block(
            &translation_bytes(&[(0x0412, 0x04b0), (0x0409, 0x04e4)]),
            "041204b0",
            "메모장",
        );
        let info = VersionInfo::parse(&block).unwrap();
        let translations = info.translations().unwrap();
        assert_eq!(translations.len(), 2);
        assert_eq!(translations[0].to_string(), "041204b0");
        assert_eq!(translations[1].to_string(), "040904e4");
        assert_eq!(info.file_description().unwrap(), "메모장");
    }

    #[test]
    fn raw_translation_bytes_are_reordered() {
        // 블록에는 09 04 b0 04 순서로 저장된다
        let entry = [0x09, 0x04, 0xb0, 0x04];
        assert_eq!(Translation::from_entry(&entry).to_string(), "040904b0");
    }

    #[test]
    fn key_lookup_is_case_insensitive() {
        let block = version_block(
            &translation_bytes(&[(0x0409, 0x04b0)]),
            "040904B0",
            "Upper Table",
        );
        assert_eq!(describe(&block).unwrap(), "Upper Table");
    }

    #[test]
    fn translation_length_not_multiple_of_four_is_rejected() {
        let block = version_block(&[0x09, 0x04, 0xb0, 0x04, 0x09, 0x04], "040904b0", "Foo");
        let err = describe(&block).unwrap_err();
        assert_eq!(err, VersionInfoError::MalformedTranslation(6));
    }

    #[test]
    fn empty_translation_table() {
        let block = version_block(&[], "040904b0", "Foo");
        assert_eq!(describe(&block).unwrap_err(), VersionInfoError::NoTranslation);
    }

    #[test]
    fn missing_string_table_for_translation() {
        let block = version_block(
            &translation_bytes(&[(0x0409, 0x04b0)]),
            "080404b0",
            "Foo",
        );
        assert!(matches!(
            describe(&block),
            Err(VersionInfoError::KeyNotFound(_))
        ));
    }

    #[test]
    fn node_length_past_block_end_is_out_of_bounds() {
        let mut block = version_block(
            &translation_bytes(&[(0x0409, 0x04b0)]),
            "040904b0",
            "Foo",
        );
        let bogus = (block.len() as u16).saturating_add(64);
        block[0..2].copy_from_slice(&bogus.to_le_bytes());
        assert!(matches!(
            VersionInfo::parse(&block),
            Err(VersionInfoError::OutOfBounds { .. })
        ));
    }

    /// 번역 테이블 노드의 wValueLength를 바꾼 블록
    fn block_with_translation_value_len(value_len: u16) -> Vec<u8> {
        let table = node(
            "040904b0",
            1,
            &[],
            0,
            &[string("FileDescription", "Foo")],
        );
        let sfi = node("StringFileInfo", 1, &[], 0, &[table]);
        let var = node(
            "Translation",
            0,
            &translation_bytes(&[(0x0409, 0x04b0)]),
            value_len,
            &[],
        );
        let vfi = node("VarFileInfo", 1, &[], 0, &[var]);
        node("VS_VERSION_INFO", 0, &[0u8; 52], 52, &[sfi, vfi])
    }

    #[test]
    fn binary_value_length_past_node_end_is_out_of_bounds() {
        assert_eq!(describe(&block_with_translation_value_len(4)).unwrap(), "Foo");
        assert!(matches!(
            describe(&block_with_translation_value_len(200)),
            Err(VersionInfoError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn text_value_length_in_bytes_is_clamped_to_node() {
        // wValueLength가 UTF-16 단위 수가 아닌 바이트 수로 기록된 String 노드
        let text: Vec<u8> = "Foo Editor\0"
            .encode_utf16()
            .flat_map(u16::to_le_bytes)
            .collect();
        let description = node("FileDescription", 1, &text, text.len() as u16, &[]);
        let table = node(
            "040904b0",
            1,
            &[],
            0,
            &[description, string("ProductName", "Foo")],
        );
        let sfi = node("StringFileInfo", 1, &[], 0, &[table]);
        let var = node(
            "Translation",
            0,
            &translation_bytes(&[(0x0409, 0x04b0)]),
            4,
            &[],
        );
        let vfi = node("VarFileInfo", 1, &[], 0, &[var]);
        let block = node("VS_VERSION_INFO", 0, &[0u8; 52], 52, &[sfi, vfi]);

        let info = VersionInfo::parse(&block).unwrap();
        assert_eq!(info.file_description().unwrap(), "Foo Editor");
        let translation = info.translations().unwrap()[0];
        assert_eq!(info.query_string(translation, "ProductName").unwrap(), "Foo");
    }

    #[test]
    fn text_value_starting_past_node_end_is_out_of_bounds() {
        // 헤더 6바이트 + 키 "A\0" 4바이트 = 10바이트, 값 시작은 정렬되어 12
        let mut block = node("A", 1, &[], 3, &[]);
        block.truncate(10);
        block[0..2].copy_from_slice(&10u16.to_le_bytes());
        assert!(matches!(
            VersionInfo::parse(&block),
            Err(VersionInfoError::OutOfBounds { offset: 12, .. })
        ));
    }

    #[test]
    fn zero_length_node_is_malformed() {
        let block = vec![0u8; 16];
        assert!(matches!(
            VersionInfo::parse(&block),
            Err(VersionInfoError::MalformedNode { .. })
        ));
    }

    #[test]
    fn truncated_block() {
        assert!(matches!(
            VersionInfo::parse(&[0x10]),
            Err(VersionInfoError::OutOfBounds { .. })
        ));
        assert!(matches!(
            VersionInfo::parse(&[]),
            Err(VersionInfoError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn reader_rejects_overflowing_offsets() {
        let reader = ByteReader::new(&[1, 2, 3, 4]);
        assert!(reader.slice(usize::MAX, 2).is_err());
        assert!(reader.slice(2, 3).is_err());
        assert_eq!(reader.slice(2, 2).unwrap(), &[3, 4]);
        assert_eq!(reader.u16_le(0).unwrap(), 0x0201);
    }

    #[test]
    fn decode_stops_at_nul() {
        let bytes = [b'F', 0, b'o', 0, 0, 0, b'x', 0];
        assert_eq!(decode_utf16z(&bytes), "Fo");
    }

    #[test]
    fn error_converts_to_recoverable_core_error() {
        let err = VersionInfoError::MalformedTranslation(6).into_core(r"C:\apps\foo.exe");
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("foo.exe"));
    }
}
