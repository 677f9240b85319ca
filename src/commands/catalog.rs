use crate::catalog::ChartCatalog;

pub fn run(lint: bool) {
    let catalog = ChartCatalog::builtin();

    println!("📚 Chart catalog: {} definitions\n", catalog.len());

    let mut ids: Vec<&str> = catalog.ids().collect();
    ids.sort();

    for id in &ids {
        let def = catalog.get(id).expect("listed id exists");
        println!("   {:<28} {}", id, def.kind());
    }

    if !lint {
        return;
    }

    println!("\n═══════════════════════════════════════════");
    let issues = catalog.lint();
    if issues.is_empty() {
        println!("✅ No dangling references or cycles");
    } else {
        // Advisory: a bad definition degrades to an empty series at
        // runtime, it does not take the catalog down
        println!("⚠️  {} issue(s) found:", issues.len());
        for issue in &issues {
            println!("   {}", issue);
        }
    }
}
