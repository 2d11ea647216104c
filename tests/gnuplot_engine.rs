use sqlplot::backend::connect;
use sqlplot::document::{Document, DocumentKind};
use sqlplot::engine::{Engine, EngineConfig, Processed};

const SETUP: &str = "\
# SQL CREATE TABLE m (g TEXT, x INTEGER, y INTEGER)
# SQL INSERT INTO m VALUES ('a', 1, 1), ('a', 2, 4), ('b', 1, 2)
";

fn process(engine: &mut Engine, name: &str, text: &str) -> (String, Processed) {
    let mut doc = Document::from_text(text);
    let processed = engine
        .process(name, DocumentKind::Gnuplot, &mut doc, &EngineConfig::default())
        .unwrap();
    (doc.to_text(), processed)
}

fn rule() -> String {
    "#".repeat(80)
}

#[test]
fn test_multiplot_keeps_entry_styles() {
    let input = format!(
        "{}set terminal pdf\n\
         # MULTIPLOT(g) SELECT MULTIPLOT, x, y FROM m ORDER BY MULTIPLOT, x\n\
         plot \\\n\
         \x20   'speed-data.txt' index 0 title \"g=a\" with lines lw 2\n",
        SETUP
    );

    let mut engine = Engine::new(connect("").unwrap());
    let (once, processed) = process(&mut engine, "plots/speed.gp", &input);
    assert!(once.ends_with(
        "plot \\\n\
         \x20   'speed-data.txt' index 0 title \"g=a\" with lines lw 2, \\\n\
         \x20   'speed-data.txt' index 1 title \"g=b\" with linespoints\n"
    ));

    let data = processed.data_file.unwrap();
    assert_eq!(data.name(), "speed-data.txt");
    assert_eq!(
        data.contents(),
        format!(
            "{}\n# MULTIPLOT(g) SELECT MULTIPLOT, x, y FROM m ORDER BY MULTIPLOT, x\n#\n\
             # index 0 g=a\n1\t1\n2\t4\n\n\n\
             # index 1 g=b\n1\t2\n\n\n",
            rule()
        )
    );

    let mut engine = Engine::new(connect("").unwrap());
    let (twice, again) = process(&mut engine, "plots/speed.gp", &once);
    assert_eq!(twice, once);
    assert_eq!(again.data_file.unwrap().contents(), data.contents());
}

#[test]
fn test_indices_restart_per_document() {
    let input = format!("{}# PLOT SELECT x, y FROM m WHERE g = 'a'\n", SETUP);
    let mut engine = Engine::new(connect("").unwrap());

    let (first, _) = process(&mut engine, "one.gp", &input);
    assert!(first.ends_with("plot \\\n    'one-data.txt' index 0 with linespoints\n"));

    let second_input = "# PLOT SELECT x, y FROM m WHERE g = 'b'\n\
                        # PLOT SELECT x, y FROM m WHERE g = 'a'\n";
    let (second, processed) = process(&mut engine, "two.gp", second_input);
    assert_eq!(
        second,
        "# PLOT SELECT x, y FROM m WHERE g = 'b'\n\
         plot \\\n\
         \x20   'two-data.txt' index 0 with linespoints\n\
         # PLOT SELECT x, y FROM m WHERE g = 'a'\n\
         plot \\\n\
         \x20   'two-data.txt' index 1 with linespoints\n"
    );
    assert!(processed
        .data_file
        .unwrap()
        .contents()
        .ends_with("# PLOT SELECT x, y FROM m WHERE g = 'a'\n#\n1\t1\n2\t4\n\n\n"));
}

#[test]
fn test_macro_alias_and_quoting() {
    let input = format!(
        "{}# MACRO SELECT COUNT(*) AS total, 'it''s' AS label FROM m\n\
         total = 0\n\
         set title label\n",
        SETUP
    );
    let mut engine = Engine::new(connect("").unwrap());
    let (out, processed) = process(&mut engine, "m.gp", &input);
    assert!(out.ends_with("total = 3\nlabel = 'it''s'\nset title label\n"));
    assert!(processed.data_file.unwrap().is_empty());
}

#[test]
fn test_ptitle_is_escaped_and_stable() {
    let input = format!(
        "{}# MULTIPLOT(g|ptitle) SELECT MULTIPLOT, x, y, 'say \"' || g || '\"' AS ptitle \
         FROM m ORDER BY MULTIPLOT, x\n",
        SETUP
    );
    let mut engine = Engine::new(connect("").unwrap());
    let (once, _) = process(&mut engine, "t.gp", &input);
    assert!(once.contains("index 0 title \"say \\\"a\\\"\" with linespoints, \\\n"));

    let mut engine = Engine::new(connect("").unwrap());
    let (twice, _) = process(&mut engine, "t.gp", &once);
    assert_eq!(twice, once);
}

#[test]
fn test_quoted_group_values_are_stable() {
    let input = "\
# SQL CREATE TABLE q (size TEXT, x INTEGER, y INTEGER)
# SQL INSERT INTO q VALUES ('12\"', 1, 1), ('a\\b', 1, 2)
# MULTIPLOT(size) SELECT MULTIPLOT, x, y FROM q ORDER BY MULTIPLOT, x
plot \\
    'q-data.txt' index 0 title \"old\" with lines lw 3
";
    let mut engine = Engine::new(connect("").unwrap());
    let (once, _) = process(&mut engine, "q.gp", input);
    assert!(once.ends_with(
        "plot \\\n\
         \x20   'q-data.txt' index 0 title \"size=12\\\"\" with lines lw 3, \\\n\
         \x20   'q-data.txt' index 1 title \"size=a\\\\b\" with linespoints\n"
    ));

    let mut engine = Engine::new(connect("").unwrap());
    let (twice, _) = process(&mut engine, "q.gp", &once);
    assert_eq!(twice, once);
}

#[test]
fn test_explicit_data_file_name() {
    let input = format!("{}# PLOT SELECT x, y FROM m\n", SETUP);
    let mut engine = Engine::new(connect("").unwrap());
    let mut doc = Document::from_text(&input);
    let config = EngineConfig {
        ranges: None,
        data_file: Some("shared.dat".into()),
    };
    let processed = engine
        .process("x.gp", DocumentKind::Gnuplot, &mut doc, &config)
        .unwrap();
    assert_eq!(processed.data_file.unwrap().name(), "shared.dat");
    assert_eq!(doc.line(doc.len() - 1), "    'shared.dat' index 0 with linespoints");
}
