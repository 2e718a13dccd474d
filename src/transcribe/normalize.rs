//! Traditional-to-simplified Chinese script normalization.
//!
//! Speech models frequently emit traditional characters for Mandarin audio.
//! This applies a bundled single-character mapping covering the high-frequency
//! conversions; characters outside the table pass through unchanged. For
//! subtitle text, cue indices and timing lines are skipped so the syntax
//! stays intact.

use std::collections::HashMap;
use tracing::debug;

/// Curated single-character traditional -> simplified pairs.
const T2S_PAIRS: &[(char, char)] = &[
    ('們', '们'), ('個', '个'), ('這', '这'), ('說', '说'), ('話', '话'),
    ('為', '为'), ('來', '来'), ('時', '时'), ('間', '间'), ('問', '问'),
    ('題', '题'), ('會', '会'), ('對', '对'), ('學', '学'), ('國', '国'),
    ('後', '后'), ('裡', '里'), ('還', '还'), ('過', '过'), ('麼', '么'),
    ('樣', '样'), ('開', '开'), ('關', '关'), ('門', '门'), ('點', '点'),
    ('現', '现'), ('實', '实'), ('發', '发'), ('經', '经'), ('應', '应'),
    ('該', '该'), ('讓', '让'), ('請', '请'), ('謝', '谢'), ('聽', '听'),
    ('寫', '写'), ('讀', '读'), ('書', '书'), ('電', '电'), ('腦', '脑'),
    ('視', '视'), ('覺', '觉'), ('聲', '声'), ('樂', '乐'), ('歲', '岁'),
    ('邊', '边'), ('頭', '头'), ('臉', '脸'), ('愛', '爱'), ('親', '亲'),
    ('熱', '热'), ('氣', '气'), ('萬', '万'), ('億', '亿'), ('數', '数'),
    ('計', '计'), ('認', '认'), ('識', '识'), ('記', '记'), ('憶', '忆'),
    ('見', '见'), ('觀', '观'), ('處', '处'), ('區', '区'), ('醫', '医'),
    ('藥', '药'), ('養', '养'), ('飯', '饭'), ('廳', '厅'), ('長', '长'),
    ('師', '师'), ('員', '员'), ('隊', '队'), ('戰', '战'), ('爭', '争'),
    ('勝', '胜'), ('負', '负'), ('級', '级'), ('紅', '红'), ('綠', '绿'),
    ('藍', '蓝'), ('黃', '黄'), ('顏', '颜'), ('島', '岛'), ('灣', '湾'),
    ('橋', '桥'), ('樹', '树'), ('葉', '叶'), ('園', '园'), ('遠', '远'),
    ('週', '周'), ('舊', '旧'), ('舉', '举'), ('習', '习'), ('練', '练'),
    ('條', '条'), ('連', '连'), ('運', '运'), ('達', '达'), ('選', '选'),
    ('擇', '择'), ('繼', '继'), ('續', '续'), ('終', '终'), ('結', '结'),
    ('總', '总'), ('統', '统'), ('領', '领'), ('導', '导'), ('權', '权'),
    ('義', '义'), ('務', '务'), ('規', '规'), ('則', '则'), ('標', '标'),
    ('準', '准'), ('確', '确'), ('證', '证'), ('據', '据'), ('論', '论'),
    ('講', '讲'), ('課', '课'), ('詞', '词'), ('頁', '页'), ('網', '网'),
    ('絡', '络'), ('線', '线'), ('專', '专'), ('傳', '传'), ('輸', '输'),
    ('響', '响'), ('聞', '闻'), ('報', '报'), ('紀', '纪'), ('錄', '录'),
    ('節', '节'), ('劇', '剧'), ('場', '场'), ('買', '买'), ('賣', '卖'),
    ('錢', '钱'), ('銀', '银'), ('車', '车'), ('馬', '马'), ('魚', '鱼'),
    ('鳥', '鸟'), ('龍', '龙'), ('風', '风'), ('雲', '云'), ('飛', '飞'),
    ('機', '机'), ('圖', '图'), ('畫', '画'), ('筆', '笔'), ('紙', '纸'),
    ('淚', '泪'), ('難', '难'), ('單', '单'), ('雙', '双'), ('動', '动'),
    ('業', '业'), ('產', '产'), ('變', '变'), ('濟', '济'), ('歷', '历'),
    ('體', '体'), ('錯', '错'), ('貝', '贝'), ('語', '语'), ('幫', '帮'),
];

/// Converts traditional Chinese text to simplified, character by character.
/// Conversion never fails; unknown characters are left as-is.
pub struct ScriptNormalizer {
    table: HashMap<char, char>,
}

impl Default for ScriptNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptNormalizer {
    pub fn new() -> Self {
        let table = T2S_PAIRS.iter().copied().collect();
        Self { table }
    }

    pub fn convert(&self, text: &str) -> String {
        text.chars()
            .map(|c| self.table.get(&c).copied().unwrap_or(c))
            .collect()
    }

    /// Convert subtitle text line by line, leaving cue indices and timing
    /// lines untouched.
    pub fn convert_subtitle(&self, content: &str) -> String {
        let converted: Vec<String> = content
            .lines()
            .map(|line| {
                let trimmed = line.trim();
                if trimmed.contains("-->") || (!trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit())) {
                    line.to_string()
                } else {
                    self.convert(line)
                }
            })
            .collect();
        debug!("Normalized {} subtitle lines", converted.len());

        let mut result = converted.join("\n");
        if content.ends_with('\n') {
            result.push('\n');
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_traditional_text() {
        let normalizer = ScriptNormalizer::new();
        assert_eq!(normalizer.convert("這個問題"), "这个问题");
        assert_eq!(normalizer.convert("學習機會"), "学习机会");
    }

    #[test]
    fn test_convert_passes_through_ascii_and_simplified() {
        let normalizer = ScriptNormalizer::new();
        assert_eq!(normalizer.convert("hello 你好 123"), "hello 你好 123");
    }

    #[test]
    fn test_convert_subtitle_skips_timing_lines() {
        let normalizer = ScriptNormalizer::new();
        let srt = "1\n00:00:00,000 --> 00:00:02,500\n這個\n\n2\n00:00:02,500 --> 00:00:05,000\n問題\n";
        let expected = "1\n00:00:00,000 --> 00:00:02,500\n这个\n\n2\n00:00:02,500 --> 00:00:05,000\n问题\n";
        assert_eq!(normalizer.convert_subtitle(srt), expected);
    }

    #[test]
    fn test_convert_subtitle_preserves_vtt_header() {
        let normalizer = ScriptNormalizer::new();
        let vtt = "WEBVTT\n\n00:00:00.000 --> 00:00:01.000\n話\n";
        let result = normalizer.convert_subtitle(vtt);
        assert!(result.starts_with("WEBVTT\n"));
        assert!(result.contains("话"));
    }

    #[test]
    fn test_table_has_no_identity_collisions() {
        // Every traditional key must be unique.
        let normalizer = ScriptNormalizer::new();
        assert_eq!(normalizer.table.len(), T2S_PAIRS.len());
    }
}
