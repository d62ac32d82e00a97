/// Localized rendering of prompts and run status.
///
/// The core only emits structured [`StatusEvent`]s; every human-readable
/// string lives here, one table per language.
use heicjpeg_core::runner::progress::StatusEvent;
use std::fmt::Display;
use std::path::Path;

/// Display language for prompts and status lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Language {
    #[default]
    En,
    Zh,
}

impl Language {
    /// The other language.
    pub fn toggled(self) -> Self {
        match self {
            Self::En => Self::Zh,
            Self::Zh => Self::En,
        }
    }

    fn table(self) -> &'static Table {
        match self {
            Self::En => &EN,
            Self::Zh => &ZH,
        }
    }
}

/// Templates use `{name}`-style placeholders filled by [`fill`].
struct Table {
    start_prompt: &'static str,
    ready_convert: &'static str,
    invalid_file: &'static str,
    unreadable_folder: &'static str,
    input_folder: &'static str,
    output_folder: &'static str,
    found_files: &'static str,
    no_files: &'static str,
    copied: &'static str,
    copy_error: &'static str,
    converted: &'static str,
    convert_error: &'static str,
    complete: &'static str,
    single_converted: &'static str,
    single_convert_error: &'static str,
    cancelled: &'static str,
    fatal: &'static str,
}

const EN: Table = Table {
    start_prompt: "Select a file or folder to start",
    ready_convert: "Ready to convert: {path}",
    invalid_file: "Please select a HEIC or HEIF image file",
    unreadable_folder: "Cannot read folder: {path}",
    input_folder: "Input folder: {path}",
    output_folder: "Output folder will be: {path}",
    found_files: "Found {images} HEIC files and {others} other files",
    no_files: "No files found to process!",
    copied: "Copied: {name}",
    copy_error: "Error copying {name}: {cause}",
    converted: "Converted: {name}",
    convert_error: "Error converting {name}: {cause}",
    complete: "Conversion complete! Files saved to: {path}",
    single_converted: "Single file converted to: {path}",
    single_convert_error: "Error converting file: {cause}",
    cancelled: "Conversion cancelled after {processed} of {total} files",
    fatal: "Error: {message}",
};

const ZH: Table = Table {
    start_prompt: "选择一个文件或文件夹开始",
    ready_convert: "准备转换: {path}",
    invalid_file: "请选择HEIC或HEIF格式的图片文件",
    unreadable_folder: "无法读取文件夹: {path}",
    input_folder: "输入文件夹: {path}",
    output_folder: "输出文件夹将会是: {path}",
    found_files: "找到 {images} 个HEIC文件和 {others} 个其他文件",
    no_files: "没有找到需要处理的文件！",
    copied: "已复制: {name}",
    copy_error: "复制 {name} 时出错: {cause}",
    converted: "已转换: {name}",
    convert_error: "转换 {name} 时出错: {cause}",
    complete: "转换完成！文件已保存到: {path}",
    single_converted: "单个文件已转换到：{path}",
    single_convert_error: "转换文件时出错：{cause}",
    cancelled: "转换已取消（已处理 {processed}/{total} 个文件）",
    fatal: "错误: {message}",
};

/// Replace each `{key}` in `template` with its value.
fn fill(template: &str, args: &[(&str, &dyn Display)]) -> String {
    args.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{key}}}"), &value.to_string())
    })
}

pub fn start_prompt(lang: Language) -> String {
    lang.table().start_prompt.to_string()
}

pub fn ready_to_convert(lang: Language, path: &Path) -> String {
    fill(lang.table().ready_convert, &[("path", &path.display())])
}

pub fn invalid_file(lang: Language) -> String {
    lang.table().invalid_file.to_string()
}

pub fn unreadable_folder(lang: Language, path: &Path) -> String {
    fill(lang.table().unreadable_folder, &[("path", &path.display())])
}

pub fn found_files(lang: Language, images: usize, others: usize) -> String {
    fill(
        lang.table().found_files,
        &[("images", &images), ("others", &others)],
    )
}

/// Render one status event in `lang`.
pub fn render_status(lang: Language, status: &StatusEvent) -> String {
    let t = lang.table();
    match status {
        StatusEvent::InputFolder { path } => fill(t.input_folder, &[("path", &path.display())]),
        StatusEvent::FilesFound { images, others } => found_files(lang, *images, *others),
        StatusEvent::NoFilesFound => t.no_files.to_string(),
        StatusEvent::OutputFolder { path } => fill(t.output_folder, &[("path", &path.display())]),
        StatusEvent::Copied { name } => fill(t.copied, &[("name", name)]),
        StatusEvent::CopyFailed { name, cause } => {
            fill(t.copy_error, &[("name", name), ("cause", cause)])
        }
        StatusEvent::Converted { name } => fill(t.converted, &[("name", name)]),
        StatusEvent::ConvertFailed { name, cause } => {
            fill(t.convert_error, &[("name", name), ("cause", cause)])
        }
        StatusEvent::SingleConverted { output } => {
            fill(t.single_converted, &[("path", &output.display())])
        }
        StatusEvent::SingleFailed { cause, .. } => fill(t.single_convert_error, &[("cause", cause)]),
        StatusEvent::InvalidFileType { .. } => t.invalid_file.to_string(),
        StatusEvent::Complete { output } => fill(t.complete, &[("path", &output.display())]),
        StatusEvent::Cancelled { processed, total } => fill(
            t.cancelled,
            &[("processed", processed), ("total", total)],
        ),
        StatusEvent::Fatal { message } => fill(t.fatal, &[("message", message)]),
    }
}
