//! Minimal HTML front end for the swap API.

/// Single page with an amount field and one button per step.
pub const INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>dex-swap</title>
<style>
  body { font-family: sans-serif; max-width: 40rem; margin: 2rem auto; }
  input { width: 100%; padding: 0.4rem; margin-bottom: 0.6rem; }
  button { margin-right: 0.4rem; }
  pre { background: #f4f4f4; padding: 0.8rem; white-space: pre-wrap; word-break: break-all; }
</style>
</head>
<body>
<h1>Swap</h1>
<label for="amount">Amount (smallest unit)</label>
<input id="amount" value="1000000000000000000">
<label for="slippage">Slippage (fraction, optional)</label>
<input id="slippage" placeholder="0.03">
<div>
  <button onclick="step('quote')">Quote</button>
  <button onclick="step('prepare')">Prepare</button>
  <button onclick="step('send')">Send</button>
  <button onclick="step('reset')">Reset</button>
</div>
<pre id="out"></pre>
<script>
async function step(name) {
  const out = document.getElementById('out');
  let body = undefined;
  if (name === 'quote') {
    body = JSON.stringify({ amount: document.getElementById('amount').value.trim() });
  } else if (name === 'prepare') {
    const s = document.getElementById('slippage').value.trim();
    body = s ? JSON.stringify({ slippage: Number(s) }) : undefined;
  }
  out.textContent = name + '...';
  const res = await fetch('/api/v1/' + name, {
    method: 'POST',
    headers: { 'Content-Type': 'application/json' },
    body,
  });
  out.textContent = res.status + '\n' + JSON.stringify(await res.json(), null, 2);
}
</script>
</body>
</html>
"#;
