use newsdesk::{
    document::{AlignType, BlockType, Document, Mark, Marks, TreeNode},
    editor::{CaretPosition, DocumentEditor},
    html::{parse_html, serialize_document},
    render::{render_document, render_view},
    theme::Theme,
};
use std::time::{Duration, Instant};

/// Performance benchmark suite for the newsdesk editor
///
/// Run with: cargo test --release --bench performance -- --nocapture
///
/// This measures:
/// - Document rendering performance
/// - HTML serialization and parsing
/// - Typing and deleting
/// - Toolbar toggles on large documents
const SMALL_DOC_BLOCKS: usize = 10;
const MEDIUM_DOC_BLOCKS: usize = 100;
const LARGE_DOC_BLOCKS: usize = 1000;
const HUGE_DOC_BLOCKS: usize = 10000;

const ITERATIONS: usize = 100;

const SAMPLE_WORDS: &[&str] = &[
    "Council", "approves", "new", "budget", "for", "the", "harbour", "district", "after",
    "a", "long", "debate", "residents", "gathered", "outside", "city", "hall", "on",
    "Tuesday", "evening", "while", "officials", "presented", "plans", "to", "rebuild",
    "bridge",
];

fn sentence(words: usize, seed: usize) -> String {
    let mut text = String::new();
    for j in 0..words {
        if j > 0 {
            text.push(' ');
        }
        text.push_str(SAMPLE_WORDS[(seed + j) % SAMPLE_WORDS.len()]);
    }
    text
}

/// Create a test document with the specified number of top-level blocks
fn create_test_document(num_blocks: usize, avg_words_per_block: usize) -> Document {
    let mut roots = Vec::with_capacity(num_blocks);
    for i in 0..num_blocks {
        let text = sentence(avg_words_per_block, i);
        let node = match i % 6 {
            0 => TreeNode::element(BlockType::HeadingTwo, vec![TreeNode::text(text)]),
            1 => TreeNode::element(BlockType::BlockQuote, vec![TreeNode::text(text)]),
            2 => TreeNode::element(
                BlockType::BulletedList,
                vec![
                    TreeNode::element(BlockType::ListItem, vec![TreeNode::text(text.clone())]),
                    TreeNode::element(BlockType::ListItem, vec![TreeNode::text(text)]),
                ],
            ),
            3 => TreeNode::paragraph(text).with_align(AlignType::Center),
            _ => TreeNode::paragraph(text),
        };
        roots.push(node);
    }
    Document::from_tree(roots)
}

/// Create a document with mixed inline marks
fn create_styled_document(num_blocks: usize) -> Document {
    let mut roots = Vec::with_capacity(num_blocks);
    for i in 0..num_blocks {
        let bold = Marks {
            bold: true,
            ..Marks::default()
        };
        let both = Marks {
            bold: true,
            italic: true,
            ..Marks::default()
        };
        let underline = Marks {
            underline: true,
            ..Marks::default()
        };
        let children = vec![
            TreeNode::text(format!("Report {i} with ")),
            TreeNode::styled("bold", if i % 15 == 0 { both } else { bold }),
            TreeNode::text(" and "),
            TreeNode::styled("underlined", underline),
            TreeNode::text(" words & <entities>."),
        ];
        roots.push(TreeNode::element(BlockType::Paragraph, children));
    }
    Document::from_tree(roots)
}

fn sized_documents() -> Vec<(&'static str, Document)> {
    vec![
        ("Small (10 blocks)", create_test_document(SMALL_DOC_BLOCKS, 20)),
        ("Medium (100 blocks)", create_test_document(MEDIUM_DOC_BLOCKS, 20)),
        ("Large (1000 blocks)", create_test_document(LARGE_DOC_BLOCKS, 20)),
        ("Huge (10000 blocks)", create_test_document(HUGE_DOC_BLOCKS, 20)),
    ]
}

fn iterations_for(name: &str) -> usize {
    if name.contains("Huge") { 10 } else { ITERATIONS }
}

fn focused(document: Document) -> DocumentEditor {
    let mut editor = DocumentEditor::new(document);
    editor.focus();
    editor
}

struct BenchmarkResult {
    name: String,
    iterations: usize,
    total_duration: Duration,
    avg_duration: Duration,
    min_duration: Duration,
    max_duration: Duration,
}

impl BenchmarkResult {
    fn print(&self) {
        println!("\n{}", "=".repeat(70));
        println!("Benchmark: {}", self.name);
        println!("{}", "=".repeat(70));
        println!("Iterations:     {}", self.iterations);
        println!("Total time:     {:?}", self.total_duration);
        println!("Average:        {:?}", self.avg_duration);
        println!("Min:            {:?}", self.min_duration);
        println!("Max:            {:?}", self.max_duration);
        println!(
            "Ops/sec:        {:.2}",
            1_000_000.0 / self.avg_duration.as_micros().max(1) as f64
        );

        if self.avg_duration.as_millis() > 100 {
            println!("\n⚠️  WARNING: Average duration > 100ms (user-perceptible lag)");
        } else if self.avg_duration.as_millis() > 16 {
            println!("\n⚠️  WARNING: Average duration > 16ms (may drop frames)");
        }
    }
}

fn benchmark<F>(name: &str, iterations: usize, mut f: F) -> BenchmarkResult
where
    F: FnMut(),
{
    let mut durations = Vec::with_capacity(iterations);

    // Warmup
    for _ in 0..10 {
        f();
    }

    for _ in 0..iterations {
        let start = Instant::now();
        f();
        durations.push(start.elapsed());
    }

    let total_duration: Duration = durations.iter().sum();
    let avg_duration = total_duration / iterations as u32;
    let min_duration = *durations.iter().min().unwrap();
    let max_duration = *durations.iter().max().unwrap();

    BenchmarkResult {
        name: name.to_string(),
        iterations,
        total_duration,
        avg_duration,
        min_duration,
        max_duration,
    }
}

#[test]
fn bench_rendering_performance() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║           RENDERING PERFORMANCE BENCHMARKS                     ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    let theme = Theme::default();
    for (name, doc) in sized_documents() {
        let editor = focused(doc);
        let result = benchmark(
            &format!("render_document - {name}"),
            iterations_for(name),
            || {
                let _ = render_document(&editor, 80, &theme);
            },
        );
        result.print();
    }
}

#[test]
fn bench_rendering_with_styles() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║        RENDERING WITH INLINE MARKS BENCHMARKS                  ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    let theme = Theme::default();
    for (name, blocks) in [
        ("Small styled (10 blocks)", SMALL_DOC_BLOCKS),
        ("Medium styled (100 blocks)", MEDIUM_DOC_BLOCKS),
        ("Large styled (1000 blocks)", LARGE_DOC_BLOCKS),
    ] {
        let mut editor = focused(create_styled_document(blocks));
        editor.select_all();
        let result = benchmark(&format!("render_document - {name}"), ITERATIONS, || {
            let _ = render_document(&editor, 80, &theme);
        });
        result.print();
    }
}

#[test]
fn bench_html_serialization() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║           HTML SERIALIZATION BENCHMARKS                        ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    for (name, doc) in sized_documents() {
        let result = benchmark(
            &format!("serialize_document - {name}"),
            iterations_for(name),
            || {
                let _ = serialize_document(&doc);
            },
        );
        result.print();
    }

    let styled = create_styled_document(MEDIUM_DOC_BLOCKS);
    let result = benchmark("serialize_document - Medium styled", ITERATIONS, || {
        let _ = serialize_document(&styled);
    });
    result.print();
}

#[test]
fn bench_html_parsing() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║           HTML PARSING AND VIEW RENDERING BENCHMARKS           ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    let theme = Theme::default();
    for (name, doc) in sized_documents() {
        let html = serialize_document(&doc);
        println!("\n{name}: {} bytes of HTML", html.len());

        let parsed = benchmark(
            &format!("parse_html - {name}"),
            iterations_for(name),
            || {
                let _ = parse_html(&html);
            },
        );
        parsed.print();

        let view = parse_html(&html);
        let rendered = benchmark(
            &format!("render_view - {name}"),
            iterations_for(name),
            || {
                let _ = render_view(&view, 80, &theme);
            },
        );
        rendered.print();
    }
}

#[test]
fn bench_toolbar_toggles() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║           TOOLBAR TOGGLE BENCHMARKS                            ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    for (name, blocks) in [
        ("Medium (100 blocks)", MEDIUM_DOC_BLOCKS),
        ("Large (1000 blocks)", LARGE_DOC_BLOCKS),
    ] {
        let mut editor = focused(create_test_document(blocks, 20));
        let middle = editor.segments().len() / 2;
        editor.move_to_position(CaretPosition::new(middle, 0), false);

        let result = benchmark(&format!("toggle_block quote - {name}"), ITERATIONS, || {
            editor.toggle_block(BlockType::BlockQuote);
        });
        result.print();

        let result = benchmark(
            &format!("toggle_block bulleted list - {name}"),
            ITERATIONS,
            || {
                editor.toggle_block(BlockType::BulletedList);
            },
        );
        result.print();

        let result = benchmark(&format!("toggle_align center - {name}"), ITERATIONS, || {
            editor.toggle_align(AlignType::Center);
        });
        result.print();

        editor.move_to_segment_start(false);
        editor.move_to_segment_end(true);
        let result = benchmark(&format!("toggle_mark bold - {name}"), ITERATIONS, || {
            editor.toggle_mark(Mark::Bold);
        });
        result.print();
    }

    let mut editor = focused(create_test_document(MEDIUM_DOC_BLOCKS, 20));
    editor.select_all();
    let result = benchmark("toggle_mark italic - whole medium document", ITERATIONS, || {
        editor.toggle_mark(Mark::Italic);
    });
    result.print();
}

#[test]
fn bench_editing_insert_text() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║       EDITING BENCHMARK: INSERT TEXT (Typing Performance)     ║");
    println!("╚════════════════════════════════════════════════════════════════╝");
    println!("\nThis simulates typing 100 words into the middle of a large");
    println!("article and re-rendering after every keystroke.");

    let theme = Theme::default();
    let mut editor = focused(create_test_document(LARGE_DOC_BLOCKS, 20));
    let middle = editor.segments().len() / 2;
    editor.move_to_position(CaretPosition::new(middle, 0), false);

    let text = sentence(100, 3);
    println!("\nDocument stats:");
    println!("  Segments: {}", editor.segments().len());
    println!("  Keystrokes: {}", text.chars().count());

    let mut typing = Vec::with_capacity(text.len());
    let mut rendering = Vec::with_capacity(text.len());
    for ch in text.chars() {
        let start = Instant::now();
        editor.insert_char(ch);
        typing.push(start.elapsed());

        let start = Instant::now();
        let _ = render_document(&editor, 80, &theme);
        rendering.push(start.elapsed());
    }

    let summarize = |label: &str, durations: &[Duration]| {
        let total: Duration = durations.iter().sum();
        let max = durations.iter().max().copied().unwrap_or_default();
        println!("\n{label}:");
        println!("  Total:   {total:?}");
        println!("  Average: {:?}", total / durations.len().max(1) as u32);
        println!("  Max:     {max:?}");
    };
    summarize("insert_char", &typing);
    summarize("render after keystroke", &rendering);

    let result = benchmark("backspace - large document", ITERATIONS, || {
        editor.backspace();
    });
    result.print();
}

#[test]
fn bench_wrap_width_impact() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║           WRAP WIDTH IMPACT BENCHMARKS                         ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    let theme = Theme::default();
    let editor = focused(create_test_document(MEDIUM_DOC_BLOCKS, 50));
    for width in [20, 40, 80, 120, 200] {
        let result = benchmark(
            &format!("render_document - width {width}"),
            ITERATIONS,
            || {
                let _ = render_document(&editor, width, &theme);
            },
        );
        result.print();
    }
}
